use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use block_dev::{Block, BlockDevice, DiskError, BLOCK_SIZE};
use send_wrapper::SendWrapper;

/// 以宿主机文件模拟的块设备
pub struct BlockFile {
    inner: SendWrapper<RefCell<File>>,
    blocks: usize,
}

impl BlockFile {
    pub fn new(fd: File, blocks: usize) -> Self {
        Self {
            inner: SendWrapper::new(RefCell::new(fd)),
            blocks,
        }
    }

    /// 打开已有镜像，块数由文件长度决定
    pub fn open(path: &Path) -> Result<Self, DiskError> {
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|err| {
                log::error!("cannot open {}: {err}", path.display());
                DiskError::Open
            })?;
        let len = fd.metadata().map_err(|_| DiskError::Open)?.len() as usize;
        if len % BLOCK_SIZE != 0 {
            log::warn!("{} has a trailing partial block", path.display());
        }

        Ok(Self::new(fd, len / BLOCK_SIZE))
    }

    /// 新建（或截断）一个`blocks`块的全零镜像
    pub fn create(path: &Path, blocks: usize) -> Result<Self, DiskError> {
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|err| {
                log::error!("cannot create {}: {err}", path.display());
                DiskError::Open
            })?;
        fd.set_len((blocks * BLOCK_SIZE) as u64)
            .map_err(|_| DiskError::Open)?;

        Ok(Self::new(fd, blocks))
    }

    fn check(&self, block_id: usize) -> Result<(), DiskError> {
        if block_id < self.blocks {
            Ok(())
        } else {
            Err(DiskError::OutOfRange(block_id))
        }
    }
}

impl BlockDevice for BlockFile {
    fn block_count(&self) -> usize {
        self.blocks
    }

    fn read_block(&self, block_id: usize, buf: &mut Block) -> Result<(), DiskError> {
        self.check(block_id)?;
        let mut file = self.inner.borrow_mut();
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .and_then(|_| file.read_exact(buf))
            .map_err(|_| DiskError::Read(block_id))
    }

    fn write_block(&self, block_id: usize, buf: &Block) -> Result<(), DiskError> {
        self.check(block_id)?;
        let mut file = self.inner.borrow_mut();
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .and_then(|_| file.write_all(buf))
            .map_err(|_| DiskError::Write(block_id))
    }

    fn flush(&self) -> Result<(), DiskError> {
        self.inner
            .borrow_mut()
            .sync_all()
            .map_err(|_| DiskError::Flush)
    }
}
