use block_dev::DiskError;
use derive_more::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[display(fmt = "no filesystem is mounted")]
    NotMounted,
    #[display(fmt = "a filesystem is already mounted")]
    AlreadyMounted,
    /// 签名不符、块数不符或布局自相矛盾
    #[display(fmt = "corrupt filesystem image")]
    CorruptFilesystem,
    #[display(fmt = "disk error: {}", _0)]
    Disk(DiskError),
    #[display(fmt = "invalid argument")]
    InvalidArgument,
    #[display(fmt = "no such file")]
    NotFound,
    #[display(fmt = "file already exists")]
    AlreadyExists,
    /// 根目录、FAT或打开文件表已满
    #[display(fmt = "capacity exceeded")]
    CapacityExceeded,
    #[display(fmt = "file descriptor is not open")]
    NotOpen,
    /// 仍有文件描述符在使用
    #[display(fmt = "resource busy")]
    Busy,
}

impl core::error::Error for Error {}

impl From<DiskError> for Error {
    fn from(err: DiskError) -> Self {
        Self::Disk(err)
    }
}

impl From<binrw::Error> for Error {
    fn from(err: binrw::Error) -> Self {
        log::warn!("malformed on-disk structure: {err}");
        Self::CorruptFilesystem
    }
}
