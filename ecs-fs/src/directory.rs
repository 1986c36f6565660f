//! 根目录：定长的文件项数组，恰好占据一块。
//!
//! 文件项一经创建便不再移动，打开文件表通过下标引用它们。

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};
use block_dev::{BlockDevice, BLOCK_SIZE};

use crate::layout::DirEntry;
use crate::{Error, FatIndex, FILENAME_MAX_LEN, ROOT_ENTRY_COUNT};

#[derive(Debug, Clone)]
pub struct RootDir {
    entries: Vec<DirEntry>,
}

/// 列目录时交给调用者的文件信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub size: usize,
    pub first_index: FatIndex,
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "file: {}, size: {}, data_blk: {}",
            self.name, self.size, self.first_index
        )
    }
}

/// 文件名非空、不含\0，且连同结尾的\0放得进文件项
pub fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty() || name.len() > FILENAME_MAX_LEN || name.contains('\0') {
        return Err(Error::InvalidArgument);
    }
    Ok(())
}

impl RootDir {
    pub fn new() -> Self {
        Self {
            entries: alloc::vec![DirEntry::FREE; ROOT_ENTRY_COUNT],
        }
    }

    /// 读入根目录块；`data_blocks`用于校验各文件的链表头
    pub fn load(dev: &dyn BlockDevice, block_id: usize, data_blocks: usize) -> Result<Self, Error> {
        let mut block = [0; BLOCK_SIZE];
        dev.read_block(block_id, &mut block)?;

        let entries = block
            .chunks_exact(DirEntry::SIZE)
            .map(|raw| DirEntry::read(&mut Cursor::new(raw)))
            .collect::<Result<Vec<_>, _>>()?;

        for (slot, entry) in entries.iter().enumerate() {
            if entry.is_free() {
                continue;
            }

            // 文件名必须可解析且唯一，否则该文件既查不到也删不掉
            let Some(name) = entry.checked_name() else {
                log::warn!("file in slot {slot} has a malformed name");
                return Err(Error::CorruptFilesystem);
            };
            if entries[..slot]
                .iter()
                .any(|other| !other.is_free() && other.name() == name)
            {
                log::warn!("file {name:?} appears more than once");
                return Err(Error::CorruptFilesystem);
            }

            let head = entry.first_index;
            if !head.is_eoc() && (head == FatIndex::GUARD || usize::from(head) >= data_blocks) {
                log::warn!("file {name:?} starts at invalid block {head}");
                return Err(Error::CorruptFilesystem);
            }
        }

        Ok(Self { entries })
    }

    pub fn flush(&self, dev: &dyn BlockDevice, block_id: usize) -> Result<(), Error> {
        let mut block = [0; BLOCK_SIZE];
        for (raw, entry) in block.chunks_exact_mut(DirEntry::SIZE).zip(&self.entries) {
            entry.write(&mut Cursor::new(raw))?;
        }
        dev.write_block(block_id, &block)?;
        Ok(())
    }

    /// 在首个空槽位创建空文件，返回槽位下标
    pub fn create(&mut self, name: &str) -> Result<usize, Error> {
        validate_name(name)?;

        if self.lookup(name).is_ok() {
            return Err(Error::AlreadyExists);
        }

        let slot = self
            .entries
            .iter()
            .position(DirEntry::is_free)
            .ok_or(Error::CapacityExceeded)?;
        self.entries[slot] = DirEntry::new(name, FatIndex::EOC);

        Ok(slot)
    }

    /// 根据文件名获取槽位下标
    pub fn lookup(&self, name: &str) -> Result<usize, Error> {
        self.entries
            .iter()
            .position(|entry| !entry.is_free() && entry.name() == name)
            .ok_or(Error::NotFound)
    }

    /// 清空槽位，返回原文件项以便释放其链表
    pub fn remove(&mut self, slot: usize) -> DirEntry {
        let entry = self.entries[slot].clone();
        self.entries[slot].clear();
        entry
    }

    #[inline]
    pub fn entry(&self, slot: usize) -> &DirEntry {
        &self.entries[slot]
    }

    #[inline]
    pub fn entry_mut(&mut self, slot: usize) -> &mut DirEntry {
        &mut self.entries[slot]
    }

    pub fn list(&self) -> Vec<FileEntry> {
        self.used()
            .map(|entry| FileEntry {
                name: entry.name().to_string(),
                size: entry.size as usize,
                first_index: entry.first_index,
            })
            .collect()
    }

    pub fn free_slots(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_free()).count()
    }

    /// 所有已占用的文件项，按槽位顺序
    pub fn used(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries.iter().filter(|entry| !entry.is_free())
    }
}

#[cfg(test)]
mod tests {
    use block_dev::RamDisk;

    use super::*;

    #[test]
    fn names() {
        assert_eq!(Ok(()), validate_name("a"));
        assert_eq!(Ok(()), validate_name("0123456789abcde"));
        assert_eq!(Err(Error::InvalidArgument), validate_name(""));
        assert_eq!(Err(Error::InvalidArgument), validate_name("0123456789abcdef"));
        assert_eq!(Err(Error::InvalidArgument), validate_name("a\0b"));
    }

    #[test]
    fn create_lookup_remove() {
        let mut root = RootDir::new();
        assert_eq!(Ok(0), root.create("a"));
        assert_eq!(Ok(1), root.create("b"));
        assert_eq!(Err(Error::AlreadyExists), root.create("a"));
        assert_eq!(Ok(1), root.lookup("b"));
        assert_eq!(Err(Error::NotFound), root.lookup("c"));

        let removed = root.remove(0);
        assert_eq!("a", removed.name());
        assert_eq!(Err(Error::NotFound), root.lookup("a"));
        // 其它文件项不会移动
        assert_eq!(Ok(1), root.lookup("b"));
        // 空出的槽位被优先使用
        assert_eq!(Ok(0), root.create("c"));
    }

    #[test]
    fn full_directory() {
        let mut root = RootDir::new();
        for i in 0..ROOT_ENTRY_COUNT {
            root.create(&alloc::format!("f{i}")).unwrap();
        }
        assert_eq!(0, root.free_slots());
        assert_eq!(Err(Error::CapacityExceeded), root.create("extra"));
    }

    #[test]
    fn listing_in_slot_order() {
        let mut root = RootDir::new();
        root.create("one").unwrap();
        root.create("two").unwrap();
        root.create("three").unwrap();
        root.remove(1);
        root.entry_mut(2).size = 42;

        let names: Vec<_> = root.list().into_iter().map(|f| (f.name, f.size)).collect();
        assert_eq!(
            alloc::vec![("one".to_string(), 0), ("three".to_string(), 42)],
            names
        );
        assert_eq!(
            "file: three, size: 42, data_blk: 65535",
            root.list()[1].to_string()
        );
    }

    #[test]
    fn flush_then_load() {
        let disk = RamDisk::new(4);
        let mut root = RootDir::new();
        let slot = root.create("data.bin").unwrap();
        root.entry_mut(slot).size = 5000;
        root.entry_mut(slot).first_index = FatIndex::new(3);
        root.flush(&disk, 2).unwrap();

        let loaded = RootDir::load(&disk, 2, 125).unwrap();
        assert_eq!(root.list(), loaded.list());
        assert_eq!(ROOT_ENTRY_COUNT - 1, loaded.free_slots());

        assert_eq!(
            Err(Error::CorruptFilesystem),
            RootDir::load(&disk, 2, 3).map(|_| ())
        );
    }

    #[test]
    fn load_rejects_duplicate_names() {
        let disk = RamDisk::new(4);
        let mut root = RootDir::new();
        root.create("a").unwrap();
        root.create("b").unwrap();
        *root.entry_mut(1) = DirEntry::new("a", FatIndex::EOC);
        root.flush(&disk, 2).unwrap();

        assert_eq!(
            Err(Error::CorruptFilesystem),
            RootDir::load(&disk, 2, 125).map(|_| ())
        );
    }

    #[test]
    fn load_rejects_malformed_names() {
        let disk = RamDisk::new(4);
        let mut root = RootDir::new();
        root.create("a").unwrap();
        root.create("bad").unwrap();
        root.flush(&disk, 2).unwrap();
        assert!(RootDir::load(&disk, 2, 125).is_ok());

        let mut block = [0; BLOCK_SIZE];
        disk.read_block(2, &mut block).unwrap();
        block[DirEntry::SIZE + 1] = 0xFF;
        disk.write_block(2, &block).unwrap();

        assert_eq!(
            Err(Error::CorruptFilesystem),
            RootDir::load(&disk, 2, 125).map(|_| ())
        );
    }
}
