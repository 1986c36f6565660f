use binrw::binrw;

use crate::{FatIndex, FILENAME_MAX_LEN};

/// 根目录中的文件项
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    // 最后一字节留给 \0，首字节为 \0 表示空槽位
    name: [u8; FILENAME_MAX_LEN + 1],
    /// 文件字节数
    pub size: u32,
    /// 簇链表的头，空文件为[`FatIndex::EOC`]
    #[brw(pad_after = 10)]
    pub first_index: FatIndex,
}

impl Default for DirEntry {
    fn default() -> Self {
        Self::FREE
    }
}

impl DirEntry {
    /// 文件项大小恒为32字节
    pub const SIZE: usize = 32;

    pub const FREE: Self = Self {
        name: [0; FILENAME_MAX_LEN + 1],
        size: 0,
        first_index: FatIndex::EOC,
    };

    /// 调用者保证`name`已通过校验
    pub fn new(name: &str, first_index: FatIndex) -> Self {
        let bytes = name.as_bytes();
        let mut raw = [0; FILENAME_MAX_LEN + 1];
        raw[..bytes.len()].copy_from_slice(bytes);

        Self {
            name: raw,
            size: 0,
            first_index,
        }
    }

    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|&c| c == 0).unwrap_or(FILENAME_MAX_LEN);
        core::str::from_utf8(&self.name[..len]).unwrap_or_default()
    }

    /// 与[`DirEntry::name`]不同，名字缺少结尾的\0或不是UTF-8时返回空
    pub fn checked_name(&self) -> Option<&str> {
        let len = self.name.iter().position(|&c| c == 0)?;
        core::str::from_utf8(&self.name[..len]).ok()
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.name[0] == 0
    }

    #[inline]
    pub fn clear(&mut self) {
        *self = Self::FREE;
    }
}
