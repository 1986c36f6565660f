//! 打开文件表

use crate::{Error, OPEN_FILE_MAX};

/// 文件描述符，即打开文件表的下标
pub type Fd = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFile {
    /// 所属文件项在根目录中的槽位
    pub slot: usize,
    /// 当前读写位置，不超过文件大小
    pub offset: usize,
}

#[derive(Debug)]
pub struct OpenFileTable {
    files: [Option<OpenFile>; OPEN_FILE_MAX],
}

impl OpenFileTable {
    pub const fn new() -> Self {
        Self {
            files: [None; OPEN_FILE_MAX],
        }
    }

    /// 占用编号最小的空闲描述符
    pub fn open(&mut self, slot: usize) -> Result<Fd, Error> {
        let fd = self
            .files
            .iter()
            .position(Option::is_none)
            .ok_or(Error::CapacityExceeded)?;
        self.files[fd] = Some(OpenFile { slot, offset: 0 });
        Ok(fd)
    }

    pub fn close(&mut self, fd: Fd) -> Result<(), Error> {
        self.get(fd)?;
        self.files[fd] = None;
        Ok(())
    }

    pub fn get(&self, fd: Fd) -> Result<&OpenFile, Error> {
        self.files
            .get(fd)
            .ok_or(Error::InvalidArgument)?
            .as_ref()
            .ok_or(Error::NotOpen)
    }

    pub fn get_mut(&mut self, fd: Fd) -> Result<&mut OpenFile, Error> {
        self.files
            .get_mut(fd)
            .ok_or(Error::InvalidArgument)?
            .as_mut()
            .ok_or(Error::NotOpen)
    }

    /// 是否有描述符引用`slot`处的文件
    pub fn references(&self, slot: usize) -> bool {
        self.files.iter().flatten().any(|file| file.slot == slot)
    }

    pub fn is_empty(&self) -> bool {
        self.files.iter().all(Option::is_none)
    }
}
