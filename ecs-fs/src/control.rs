//! # 文件系统控制层
//!
//! [`FileSystem`]持有全部内存状态：超级块、FAT、根目录与打开文件表。
//! 挂载时整体读入，卸载时整体写回，其间的操作只修改内存。

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use block_dev::BlockDevice;

use crate::directory::{FileEntry, RootDir};
use crate::fat::FatArea;
use crate::file::{Fd, OpenFileTable};
use crate::{Error, FatIndex, SuperBlock, ROOT_ENTRY_COUNT};

/// 未挂载时为空；并发使用时应整体置于一把锁之后
#[derive(Default)]
pub struct FileSystem {
    volume: Option<Volume>,
}

/// 已挂载的卷
pub(crate) struct Volume {
    pub(crate) device: Arc<dyn BlockDevice>,
    pub(crate) super_block: SuperBlock,
    pub(crate) fat: FatArea,
    pub(crate) root: RootDir,
    pub(crate) files: OpenFileTable,
}

/// 卷的概况
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsInfo {
    pub total_blocks: usize,
    pub fat_blocks: usize,
    pub root_dir_index: usize,
    pub data_start: usize,
    pub data_blocks: usize,
    /// 空闲的FAT条目，不计保留条目
    pub fat_free: usize,
    pub root_free: usize,
}

impl fmt::Display for FsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FS Info:")?;
        writeln!(f, "total_blk_count={}", self.total_blocks)?;
        writeln!(f, "fat_blk_count={}", self.fat_blocks)?;
        writeln!(f, "rdir_blk={}", self.root_dir_index)?;
        writeln!(f, "data_blk={}", self.data_start)?;
        writeln!(f, "data_blk_count={}", self.data_blocks)?;
        writeln!(f, "fat_free_ratio={}/{}", self.fat_free, self.data_blocks)?;
        write!(f, "rdir_free_ratio={}/{}", self.root_free, ROOT_ENTRY_COUNT)
    }
}

impl FileSystem {
    pub const fn new() -> Self {
        Self { volume: None }
    }

    /// 在设备上写入一个全新的空文件系统，返回其超级块
    pub fn format(device: &dyn BlockDevice) -> Result<SuperBlock, Error> {
        let Some(super_block) = SuperBlock::new(device.block_count()) else {
            log::warn!(
                "a device of {} blocks cannot hold a filesystem",
                device.block_count()
            );
            return Err(Error::InvalidArgument);
        };

        device.write_block(0, &super_block.encode()?)?;
        FatArea::new(super_block.data_blocks as usize).flush(device, &super_block)?;
        RootDir::new().flush(device, super_block.root_dir_index as usize)?;
        device.flush()?;

        log::info!(
            "formatted {} blocks: {} FAT blocks, {} data blocks",
            super_block.total_blocks,
            super_block.fat_blocks,
            super_block.data_blocks
        );
        Ok(super_block)
    }

    pub fn mount(&mut self, device: Arc<dyn BlockDevice>) -> Result<(), Error> {
        if self.volume.is_some() {
            return Err(Error::AlreadyMounted);
        }

        let mut block = [0; block_dev::BLOCK_SIZE];
        device.read_block(0, &mut block)?;
        let super_block = SuperBlock::parse(&block)?;

        if device.block_count() != super_block.total_blocks as usize {
            log::warn!(
                "device has {} blocks but the superblock declares {}",
                device.block_count(),
                super_block.total_blocks
            );
            return Err(Error::CorruptFilesystem);
        }
        if !super_block.is_valid() {
            log::warn!("inconsistent layout: {super_block:?}");
            return Err(Error::CorruptFilesystem);
        }

        let fat = FatArea::load(&*device, &super_block)?;
        let root = RootDir::load(
            &*device,
            super_block.root_dir_index as usize,
            super_block.data_blocks as usize,
        )?;

        log::info!("mounted a filesystem of {} blocks", super_block.total_blocks);
        self.volume = Some(Volume {
            device,
            super_block,
            fat,
            root,
            files: OpenFileTable::new(),
        });
        Ok(())
    }

    /// 写回FAT与根目录并释放内存状态。
    ///
    /// 写回失败时保持挂载，调用者可以重试。
    pub fn unmount(&mut self) -> Result<(), Error> {
        let volume = self.volume()?;
        if !volume.files.is_empty() {
            return Err(Error::Busy);
        }

        let device = &*volume.device;
        volume.fat.flush(device, &volume.super_block)?;
        volume
            .root
            .flush(device, volume.super_block.root_dir_index as usize)?;
        device.flush()?;

        self.volume = None;
        log::info!("unmounted");
        Ok(())
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.volume.is_some()
    }

    pub fn info(&self) -> Result<FsInfo, Error> {
        let volume = self.volume()?;
        let sb = &volume.super_block;
        Ok(FsInfo {
            total_blocks: sb.total_blocks as usize,
            fat_blocks: sb.fat_blocks as usize,
            root_dir_index: sb.root_dir_index as usize,
            data_start: sb.data_start as usize,
            data_blocks: sb.data_blocks as usize,
            fat_free: volume.fat.free_count(),
            root_free: volume.root.free_slots(),
        })
    }

    /// 在根目录下创建空文件
    pub fn create(&mut self, name: &str) -> Result<(), Error> {
        let slot = self.volume_mut()?.root.create(name)?;
        log::debug!("created {name:?} in slot {slot}");
        Ok(())
    }

    /// 删除文件并释放其全部数据块；仍被打开的文件不能删除
    pub fn delete(&mut self, name: &str) -> Result<(), Error> {
        let volume = self.volume_mut()?;
        crate::directory::validate_name(name)?;

        let slot = volume.root.lookup(name)?;
        if volume.files.references(slot) {
            return Err(Error::Busy);
        }

        let entry = volume.root.remove(slot);
        let freed = volume.fat.free_chain(entry.first_index);
        log::debug!("deleted {name:?}, released {freed} blocks");
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<FileEntry>, Error> {
        Ok(self.volume()?.root.list())
    }

    pub fn open(&mut self, name: &str) -> Result<Fd, Error> {
        let volume = self.volume_mut()?;
        let slot = volume.root.lookup(name)?;
        let fd = volume.files.open(slot)?;
        log::debug!("opened {name:?} as fd {fd}");
        Ok(fd)
    }

    pub fn close(&mut self, fd: Fd) -> Result<(), Error> {
        self.volume_mut()?.files.close(fd)?;
        log::debug!("closed fd {fd}");
        Ok(())
    }

    /// 文件的当前大小
    pub fn stat(&self, fd: Fd) -> Result<usize, Error> {
        let volume = self.volume()?;
        let file = volume.files.get(fd)?;
        Ok(volume.root.entry(file.slot).size as usize)
    }

    /// 设置读写位置，不能越过文件末尾
    pub fn seek(&mut self, fd: Fd, offset: usize) -> Result<(), Error> {
        let volume = self.volume_mut()?;
        let file = volume.files.get(fd)?;
        if offset > volume.root.entry(file.slot).size as usize {
            return Err(Error::InvalidArgument);
        }
        volume.files.get_mut(fd)?.offset = offset;
        Ok(())
    }
}

impl FileSystem {
    #[inline]
    pub(crate) fn volume(&self) -> Result<&Volume, Error> {
        self.volume.as_ref().ok_or(Error::NotMounted)
    }

    #[inline]
    pub(crate) fn volume_mut(&mut self) -> Result<&mut Volume, Error> {
        self.volume.as_mut().ok_or(Error::NotMounted)
    }
}

impl Volume {
    /// FAT索引对应的设备块号
    #[inline]
    pub(crate) fn data_block(&self, index: FatIndex) -> usize {
        self.super_block.data_start as usize + usize::from(index)
    }

    /// 当前每个已占用块恰属于一个文件，且没有泄漏的块
    #[cfg(test)]
    pub(crate) fn chains_are_consistent(&self) -> bool {
        let mut owner = alloc::vec![0usize; self.fat.len()];
        for entry in self.root.used() {
            for index in self.fat.chain(entry.first_index) {
                owner[usize::from(index)] += 1;
            }
        }

        (1..self.fat.len()).all(|i| {
            let allocated = self.fat.next(FatIndex::new(i as u16)) != FatIndex::FREE;
            owner[i] == usize::from(allocated)
        })
    }
}
