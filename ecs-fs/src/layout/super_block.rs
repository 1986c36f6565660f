use core::ops::Range;

use binrw::io::Cursor;
use binrw::{binrw, BinRead, BinWrite};
use block_dev::{Block, BLOCK_SIZE};

use crate::{Error, FAT_ENTRIES_PER_BLOCK};

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 定位其它连续区域
///
/// 签名之后的字段紧密排列，块的剩余部分皆填0。
#[binrw]
#[brw(little, magic = b"ECS150FS")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperBlock {
    /// 文件系统占据块数
    pub total_blocks: u16,
    pub root_dir_index: u16,
    /// 数据区的起始块
    pub data_start: u16,
    pub data_blocks: u16,
    pub fat_blocks: u8,
}

impl SuperBlock {
    /// 为有`total_blocks`块的设备规划布局。
    ///
    /// 数据块数与FAT块数相互制约，只有恰好能划分的设备才有解。
    pub fn new(total_blocks: usize) -> Option<Self> {
        if !(5..=u16::MAX as usize).contains(&total_blocks) {
            return None;
        }

        // 扣除超级块与根目录
        let rest = total_blocks - 2;
        (1..=u8::MAX as usize).find_map(|fat_blocks| {
            let data_blocks = rest.checked_sub(fat_blocks)?;
            (data_blocks.div_ceil(FAT_ENTRIES_PER_BLOCK) == fat_blocks).then_some(Self {
                total_blocks: total_blocks as u16,
                root_dir_index: fat_blocks as u16 + 1,
                data_start: fat_blocks as u16 + 2,
                data_blocks: data_blocks as u16,
                fat_blocks: fat_blocks as u8,
            })
        })
    }

    /// 解析块0；签名不符即视为损坏
    pub fn parse(block: &Block) -> Result<Self, Error> {
        Ok(Self::read(&mut Cursor::new(&block[..]))?)
    }

    pub fn encode(&self) -> Result<Block, Error> {
        let mut block = [0; BLOCK_SIZE];
        self.write(&mut Cursor::new(&mut block[..]))?;
        Ok(block)
    }

    /// 各区域的位置与大小是否自洽
    pub fn is_valid(&self) -> bool {
        let fat_blocks = self.fat_blocks as usize;
        let data_blocks = self.data_blocks as usize;

        fat_blocks > 0
            && data_blocks > 0
            && data_blocks.div_ceil(FAT_ENTRIES_PER_BLOCK) == fat_blocks
            && self.root_dir_index as usize == fat_blocks + 1
            && self.data_start as usize == fat_blocks + 2
            && self.data_area().end == self.total_blocks as usize
    }

    /// FAT区占据的块
    #[inline]
    pub fn fat_area(&self) -> Range<usize> {
        1..1 + self.fat_blocks as usize
    }

    /// 数据区占据的块
    #[inline]
    pub fn data_area(&self) -> Range<usize> {
        let start = self.data_start as usize;
        start..start + self.data_blocks as usize
    }
}
