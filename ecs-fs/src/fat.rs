//! 文件分配表
//!
//! 整张表以数组形式常驻内存，下标即数据区内块的索引，
//! 条目的值为链表上下一块的索引。挂载时整体读入，卸载时整体写回。

use alloc::vec;
use alloc::vec::Vec;

use block_dev::{BlockDevice, BLOCK_SIZE};

use crate::{Error, FatIndex, SuperBlock, FAT_ENTRIES_PER_BLOCK};

#[derive(Debug, Clone)]
pub struct FatArea {
    entries: Vec<FatIndex>,
}

impl FatArea {
    /// 格式化后的空表：除保留的0号条目外全部空闲
    pub fn new(data_blocks: usize) -> Self {
        let mut entries = vec![FatIndex::FREE; data_blocks];
        entries[usize::from(FatIndex::GUARD)] = FatIndex::EOC;
        Self { entries }
    }

    pub fn load(dev: &dyn BlockDevice, sb: &SuperBlock) -> Result<Self, Error> {
        let data_blocks = sb.data_blocks as usize;
        let mut entries = Vec::with_capacity(sb.fat_blocks as usize * FAT_ENTRIES_PER_BLOCK);
        let mut block = [0; BLOCK_SIZE];

        for block_id in sb.fat_area() {
            dev.read_block(block_id, &mut block)?;
            entries.extend(
                block
                    .chunks_exact(2)
                    .map(|raw| FatIndex::new(u16::from_le_bytes([raw[0], raw[1]]))),
            );
        }
        entries.truncate(data_blocks);

        // 指针必须落在表内，否则后续遍历会越界
        if let Some(bad) = entries
            .iter()
            .position(|&next| !next.is_eoc() && usize::from(next) >= data_blocks)
        {
            let (block, slot) = Self::position(FatIndex::new(bad as u16));
            log::warn!("FAT entry {bad} (block {block}, slot {slot}) points outside the data area");
            return Err(Error::CorruptFilesystem);
        }

        Ok(Self { entries })
    }

    pub fn flush(&self, dev: &dyn BlockDevice, sb: &SuperBlock) -> Result<(), Error> {
        let mut chunks = self.entries.chunks(FAT_ENTRIES_PER_BLOCK);
        let mut block = [0; BLOCK_SIZE];

        for block_id in sb.fat_area() {
            block.fill(0);
            if let Some(chunk) = chunks.next() {
                for (raw, &entry) in block.chunks_exact_mut(2).zip(chunk) {
                    raw.copy_from_slice(&u16::from(entry).to_le_bytes());
                }
            }
            dev.write_block(block_id, &block)?;
        }

        Ok(())
    }

    /// 表内条目数，即数据块数
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 寻找并占用一个空闲条目，占用后它即是新链表的尾
    pub fn alloc(&mut self) -> Result<FatIndex, Error> {
        let index = self
            .entries
            .iter()
            .skip(FatIndex::MIN.into())
            .position(|&entry| entry == FatIndex::FREE)
            .map(|pos| pos + usize::from(FatIndex::MIN))
            .ok_or(Error::CapacityExceeded)?;

        self.entries[index] = FatIndex::EOC;
        log::trace!("allocated FAT entry {index}");
        Ok(FatIndex::new(index as u16))
    }

    /// 在链表尾`last`之后追加一块；空间用尽时链表保持不变
    pub fn extend(&mut self, last: FatIndex) -> Result<FatIndex, Error> {
        debug_assert!(self.next(last).is_eoc());
        let new = self.alloc()?;
        self.entries[usize::from(last)] = new;
        Ok(new)
    }

    /// 获取下一块的索引，[`FatIndex::EOC`]表示`index`为链表上最后一块
    #[inline]
    pub fn next(&self, index: FatIndex) -> FatIndex {
        self.entries[usize::from(index)]
    }

    /// 从`head`出发前进`steps`步；链表提前结束则返回空
    pub fn walk(&self, head: FatIndex, steps: usize) -> Option<FatIndex> {
        self.chain(head).nth(steps)
    }

    /// 按链表顺序释放整条链，返回释放的块数。
    ///
    /// 逐个清零保证中途中断时剩下的仍是一条可遍历的链。
    pub fn free_chain(&mut self, head: FatIndex) -> usize {
        let mut current = head;
        let mut freed = 0;

        while !current.is_eoc() {
            // 成环的链最多访问整张表一次
            if freed == self.len() || current == FatIndex::GUARD {
                log::warn!("FAT chain starting at {head} is malformed");
                break;
            }
            let slot = &mut self.entries[usize::from(current)];
            current = *slot;
            *slot = FatIndex::FREE;
            freed += 1;
        }

        freed
    }

    /// 空闲条目数，不计保留的0号条目
    pub fn free_count(&self) -> usize {
        self.entries
            .iter()
            .skip(FatIndex::MIN.into())
            .filter(|&&entry| entry == FatIndex::FREE)
            .count()
    }

    /// 链表上的全部索引，按顺序
    pub fn chain(&self, head: FatIndex) -> impl Iterator<Item = FatIndex> + '_ {
        let mut current = head;
        core::iter::from_fn(move || {
            if current.is_eoc() {
                return None;
            }
            let index = current;
            current = self.next(current);
            Some(index)
        })
        .take(self.len())
    }

    /// 返回条目实际所处的磁盘位置（FAT区内的块序号 + 块内索引）
    #[inline]
    pub fn position(index: FatIndex) -> (usize, usize) {
        let index = usize::from(index);
        (index / FAT_ENTRIES_PER_BLOCK, index % FAT_ENTRIES_PER_BLOCK)
    }
}
