mod block_file;
mod cli;

use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use block_dev::BlockDevice;
use clap::Parser;
use ecs_fs::FileSystem;

use self::{
    block_file::BlockFile,
    cli::{Cli, Command},
};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    match Cli::parse().command {
        Command::Make { image, blocks } => {
            let block_file = BlockFile::create(&image, blocks)?;
            let sb = FileSystem::format(&block_file)?;
            println!(
                "created {:?}: {} blocks, {} data blocks",
                image, sb.total_blocks, sb.data_blocks
            );
        }
        Command::Info { image } => {
            let fs = mount(&image)?;
            println!("{}", fs.info()?);
        }
        Command::Ls { image } => {
            let fs = mount(&image)?;
            println!("FS Ls:");
            for file in fs.list()? {
                println!("{file}");
            }
        }
        Command::Add { image, file } => {
            let name = file
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or("host file name is not valid UTF-8")?
                .to_owned();
            let data = fs::read(&file)?;

            let mut fs = mount(&image)?;
            fs.create(&name)?;
            let fd = fs.open(&name)?;
            let wrote_size = fs.write(fd, &data)?;
            fs.close(fd)?;
            fs.unmount()?;

            log::info!("file={name:?}");
            if wrote_size < data.len() {
                eprintln!("disk full: wrote {wrote_size} of {} bytes", data.len());
            } else {
                println!("wrote {wrote_size} bytes to {name:?}");
            }
        }
        Command::Rm { image, name } => {
            let mut fs = mount(&image)?;
            fs.delete(&name)?;
            fs.unmount()?;
        }
        Command::Cat { image, name } => {
            let mut fs = mount(&image)?;
            let fd = fs.open(&name)?;
            let mut data = vec![0; fs.stat(fd)?];
            let read_size = fs.read(fd, &mut data)?;
            fs.close(fd)?;
            io::stdout().write_all(&data[..read_size])?;
        }
        Command::Stat { image, name } => {
            let mut fs = mount(&image)?;
            let fd = fs.open(&name)?;
            println!("Size of file '{name}' is {} bytes", fs.stat(fd)?);
            fs.close(fd)?;
        }
    }

    Ok(())
}

fn mount(image: &Path) -> Result<FileSystem, Box<dyn Error>> {
    let block_dev: Arc<dyn BlockDevice> = Arc::new(BlockFile::open(image)?);
    let mut fs = FileSystem::new();
    fs.mount(block_dev)?;
    Ok(fs)
}
