#![no_std]

extern crate alloc;

/* ecs-fs 的整体架构，自上而下 */

// 文件系统控制层：挂载、卸载、格式化以及对外的全部操作
mod control;

// 读写引擎：跨块读写与弹跳缓冲
mod io;

// 打开文件表
mod file;

// 根目录
mod directory;

// 文件分配表
mod fat;

// 磁盘数据结构层
mod layout;

mod error;
mod fat_index;

pub use self::{
    control::{FileSystem, FsInfo},
    directory::FileEntry,
    error::Error,
    fat_index::FatIndex,
    file::Fd,
    layout::SuperBlock,
};
pub use block_dev::{BlockDevice, DiskError, BLOCK_SIZE};

/// 超级块签名
pub const SIGNATURE: [u8; 8] = *b"ECS150FS";
/// FAT中表示链表结束的值
pub const FAT_EOC: u16 = 0xFFFF;
/// 一个FAT块容纳的条目数
pub const FAT_ENTRIES_PER_BLOCK: usize = BLOCK_SIZE / 2;
/// 根目录的槽位数，恰好占满一块
pub const ROOT_ENTRY_COUNT: usize = 128;
/// 文件名的最大字节数，不含结尾的\0
pub const FILENAME_MAX_LEN: usize = 15;
/// 同时打开的文件描述符上限
pub const OPEN_FILE_MAX: usize = 32;
