use alloc::boxed::Box;
use alloc::vec::Vec;

use spin::Mutex;

use crate::{Block, BlockDevice, DiskError, BLOCK_SIZE};

/// 内存中的块设备，供测试与镜像构建使用
#[derive(Debug)]
pub struct RamDisk {
    blocks: Mutex<Vec<Box<Block>>>,
}

impl RamDisk {
    /// 创建`block_count`个全零块
    pub fn new(block_count: usize) -> Self {
        let blocks = (0..block_count)
            .map(|_| Box::new([0; BLOCK_SIZE]))
            .collect();
        Self {
            blocks: Mutex::new(blocks),
        }
    }

    /// 以现有镜像内容构建设备，尾部不足一块的部分补零
    pub fn from_image(image: &[u8]) -> Self {
        let blocks = image
            .chunks(BLOCK_SIZE)
            .map(|chunk| {
                let mut block = Box::new([0; BLOCK_SIZE]);
                block[..chunk.len()].copy_from_slice(chunk);
                block
            })
            .collect();
        Self {
            blocks: Mutex::new(blocks),
        }
    }

    /// 导出整个设备的内容
    pub fn to_image(&self) -> Vec<u8> {
        self.blocks
            .lock()
            .iter()
            .flat_map(|block| block.iter().copied())
            .collect()
    }
}

impl BlockDevice for RamDisk {
    fn block_count(&self) -> usize {
        self.blocks.lock().len()
    }

    fn read_block(&self, block_id: usize, buf: &mut Block) -> Result<(), DiskError> {
        let blocks = self.blocks.lock();
        let block = blocks.get(block_id).ok_or(DiskError::OutOfRange(block_id))?;
        buf.copy_from_slice(&block[..]);
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &Block) -> Result<(), DiskError> {
        let mut blocks = self.blocks.lock();
        let block = blocks
            .get_mut(block_id)
            .ok_or(DiskError::OutOfRange(block_id))?;
        block.copy_from_slice(buf);
        Ok(())
    }
}
