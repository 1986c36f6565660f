//! # 磁盘数据结构层
//!
//! ecs-fs 的磁盘布局：
//! 超级块 | FAT区 | 根目录 | 数据区

mod super_block;
pub use super_block::SuperBlock;

/// 文件项，占根目录块的一个槽位
mod dir_entry;
pub use dir_entry::DirEntry;

#[cfg(test)]
mod tests {
    use binrw::io::Cursor;
    use binrw::BinWrite;

    use super::*;
    use crate::{FatIndex, ROOT_ENTRY_COUNT};
    use block_dev::BLOCK_SIZE;

    #[test]
    fn dir_entries_fill_one_block() {
        let mut block = [0u8; BLOCK_SIZE];
        let mut cursor = Cursor::new(&mut block[..]);
        let entry = DirEntry::new("a", FatIndex::EOC);
        for _ in 0..ROOT_ENTRY_COUNT {
            entry.write(&mut cursor).unwrap();
        }
        assert_eq!(BLOCK_SIZE as u64, cursor.position());
        assert_eq!(DirEntry::SIZE * ROOT_ENTRY_COUNT, BLOCK_SIZE);
    }

    #[test]
    fn super_block_fields_are_packed() {
        let sb = SuperBlock::new(128).unwrap();
        let mut block = [0u8; BLOCK_SIZE];
        let mut cursor = Cursor::new(&mut block[..]);
        sb.write(&mut cursor).unwrap();
        // 8 + 2 * 4 + 1
        assert_eq!(17, cursor.position());
    }
}
