use binrw::binrw;
use derive_more::{Display, From, Into};

/// FAT条目，同时也是数据区内块的索引。
///
/// 条目的值指向链表上的下一块：`0`表示空闲，[`FatIndex::EOC`]表示链表结束。
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
#[repr(transparent)]
pub struct FatIndex(u16);

impl FatIndex {
    pub const FREE: Self = Self(0);

    /// 0号条目永久保留，使`0`只表示空闲
    pub const GUARD: Self = Self(0);

    /// 最小的可分配索引
    pub const MIN: Self = Self(1);

    /// End of chain
    pub const EOC: Self = Self(crate::FAT_EOC);

    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn is_eoc(self) -> bool {
        self == Self::EOC
    }
}

impl From<FatIndex> for usize {
    fn from(index: FatIndex) -> Self {
        index.0 as usize
    }
}
