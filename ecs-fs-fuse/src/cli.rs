use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Create and edit ECS150FS disk images")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a disk image and format it
    Make {
        image: PathBuf,
        /// Total number of 4 KiB blocks
        blocks: usize,
    },

    /// Print the layout and free space of an image
    Info { image: PathBuf },

    /// List the files of an image
    Ls { image: PathBuf },

    /// Copy a host file into an image
    Add { image: PathBuf, file: PathBuf },

    /// Delete a file from an image
    Rm { image: PathBuf, name: String },

    /// Print a file of an image to stdout
    Cat { image: PathBuf, name: String },

    /// Print the size of a file
    Stat { image: PathBuf, name: String },
}
