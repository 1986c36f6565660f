//! # 读写引擎
//!
//! 读写位置先换算成簇链表上的第几块与块内偏移，再逐块搬运。
//! 读写一般不与块对齐，所以每块都经过一个块大小的弹跳缓冲。

use block_dev::{Block, BLOCK_SIZE};

use crate::control::Volume;
use crate::file::{Fd, OpenFile};
use crate::{Error, FatIndex, FileSystem};

impl FileSystem {
    /// 从当前位置写入，必要时延长簇链表。
    ///
    /// 数据块用尽时提前结束并返回已写入的字节数，这不算错误。
    pub fn write(&mut self, fd: Fd, buf: &[u8]) -> Result<usize, Error> {
        self.volume_mut()?.write(fd, buf)
    }

    /// 从当前位置读取，至多读到文件末尾
    pub fn read(&mut self, fd: Fd, buf: &mut [u8]) -> Result<usize, Error> {
        self.volume_mut()?.read(fd, buf)
    }
}

impl Volume {
    fn write(&mut self, fd: Fd, buf: &[u8]) -> Result<usize, Error> {
        let OpenFile { slot, offset } = *self.files.get(fd)?;
        if buf.is_empty() {
            return Ok(0);
        }

        // 空文件先分配首块
        let mut fresh = false;
        let mut head = self.root.entry(slot).first_index;
        if head.is_eoc() {
            head = self.fat.alloc()?;
            self.root.entry_mut(slot).first_index = head;
            fresh = true;
        }

        let mut wrote_size = 0;
        let result = self.write_chain(head, fresh, offset, buf, &mut wrote_size);

        // 即使中途出错，已落盘的部分也要记账
        let end = offset + wrote_size;
        self.files.get_mut(fd)?.offset = end;
        let entry = self.root.entry_mut(slot);
        if end > entry.size as usize {
            entry.size = end as u32;
        }

        if wrote_size < buf.len() && result.is_ok() {
            log::warn!("short write on fd {fd}: {wrote_size} of {} bytes", buf.len());
        }
        result.map(|()| wrote_size)
    }

    fn write_chain(
        &mut self,
        head: FatIndex,
        mut fresh: bool,
        offset: usize,
        buf: &[u8],
        wrote_size: &mut usize,
    ) -> Result<(), Error> {
        let Some(mut current) = self.seek_block(head, offset / BLOCK_SIZE, &mut fresh)? else {
            return Ok(());
        };
        let mut bounce: Block = [0; BLOCK_SIZE];

        loop {
            let inner = (offset + *wrote_size) % BLOCK_SIZE;
            let block_write_size = (buf.len() - *wrote_size).min(BLOCK_SIZE - inner);
            let block_id = self.data_block(current);

            // 新分配的块原有内容无意义；整块覆盖也无需读出
            if fresh {
                bounce.fill(0);
            } else if block_write_size < BLOCK_SIZE {
                self.device.read_block(block_id, &mut bounce)?;
            }
            bounce[inner..inner + block_write_size]
                .copy_from_slice(&buf[*wrote_size..*wrote_size + block_write_size]);
            self.device.write_block(block_id, &bounce)?;
            log::trace!("wrote {block_write_size} bytes to block {block_id}");

            *wrote_size += block_write_size;
            if *wrote_size == buf.len() {
                return Ok(());
            }

            current = match self.fat.next(current) {
                FatIndex::EOC => match self.fat.extend(current) {
                    Ok(next) => {
                        fresh = true;
                        next
                    }
                    Err(Error::CapacityExceeded) => return Ok(()),
                    Err(e) => return Err(e),
                },
                next => {
                    fresh = false;
                    next
                }
            };
        }
    }

    /// 从`head`前进`steps`块。
    ///
    /// 位置恰好落在已分配链表的末尾时追加一块；数据块用尽则返回空。
    fn seek_block(
        &mut self,
        head: FatIndex,
        steps: usize,
        fresh: &mut bool,
    ) -> Result<Option<FatIndex>, Error> {
        let mut current = head;
        for _ in 0..steps {
            current = match self.fat.next(current) {
                FatIndex::EOC => match self.fat.extend(current) {
                    Ok(next) => {
                        *fresh = true;
                        next
                    }
                    Err(Error::CapacityExceeded) => return Ok(None),
                    Err(e) => return Err(e),
                },
                next => {
                    *fresh = false;
                    next
                }
            };
        }
        Ok(Some(current))
    }

    fn read(&mut self, fd: Fd, buf: &mut [u8]) -> Result<usize, Error> {
        let OpenFile { slot, offset } = *self.files.get(fd)?;
        let entry = self.root.entry(slot);
        let (head, file_size) = (entry.first_index, entry.size as usize);

        if buf.is_empty() || head.is_eoc() || offset >= file_size {
            return Ok(0);
        }

        let end = file_size.min(offset + buf.len());
        let mut read_size = 0;
        let result = self.read_chain(head, offset, &mut buf[..end - offset], &mut read_size);

        self.files.get_mut(fd)?.offset = offset + read_size;
        result.map(|()| read_size)
    }

    fn read_chain(
        &self,
        head: FatIndex,
        offset: usize,
        buf: &mut [u8],
        read_size: &mut usize,
    ) -> Result<(), Error> {
        let Some(mut current) = self.fat.walk(head, offset / BLOCK_SIZE) else {
            log::warn!("chain at {head} ends before offset {offset}");
            return Ok(());
        };
        let mut bounce: Block = [0; BLOCK_SIZE];

        loop {
            let inner = (offset + *read_size) % BLOCK_SIZE;
            let block_read_size = (buf.len() - *read_size).min(BLOCK_SIZE - inner);
            let block_id = self.data_block(current);

            self.device.read_block(block_id, &mut bounce)?;
            buf[*read_size..*read_size + block_read_size]
                .copy_from_slice(&bounce[inner..inner + block_read_size]);
            log::trace!("read {block_read_size} bytes from block {block_id}");

            *read_size += block_read_size;
            if *read_size == buf.len() {
                return Ok(());
            }

            current = self.fat.next(current);
            if current.is_eoc() {
                log::warn!("chain at {head} ends before the end of file");
                return Ok(());
            }
        }
    }
}
