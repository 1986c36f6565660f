//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、光盘、U盘等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 所有读写都以整块为单位，块大小恒为 [`BLOCK_SIZE`]。

#![no_std]

extern crate alloc;

mod ram;

use core::any::Any;

use derive_more::Display;

pub use self::ram::RamDisk;

pub const BLOCK_SIZE: usize = 4096;

/// 一个完整的块
pub type Block = [u8; BLOCK_SIZE];

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum DiskError {
    /// 无法打开底层介质
    #[display(fmt = "cannot open the device")]
    Open,
    /// 块号超出设备范围
    #[display(fmt = "block {} is out of range", _0)]
    OutOfRange(usize),
    #[display(fmt = "failed to read block {}", _0)]
    Read(usize),
    #[display(fmt = "failed to write block {}", _0)]
    Write(usize),
    /// 同步到介质失败
    #[display(fmt = "failed to flush the device")]
    Flush,
}

impl core::error::Error for DiskError {}

/// 块设备驱动特质
pub trait BlockDevice: Send + Sync + Any {
    /// 设备上的块总数
    fn block_count(&self) -> usize;

    fn read_block(&self, block_id: usize, buf: &mut Block) -> Result<(), DiskError>;

    fn write_block(&self, block_id: usize, buf: &Block) -> Result<(), DiskError>;

    /// 把设备自身可能持有的缓冲写回介质
    fn flush(&self) -> Result<(), DiskError> {
        Ok(())
    }
}
