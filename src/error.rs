use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("entry index {index} is outside the table ({count} entries)")]
    InvalidIndex { index: u32, count: u32 },

    #[error("string table offset {offset:#x} is outside the table ({len:#x} bytes)")]
    OutOfRange { offset: u32, len: usize },

    #[error("malformed table at entry {index}: {reason}")]
    MalformedTable { index: u32, reason: &'static str },

    #[error("unsupported host entry type: {}", .path.display())]
    UnsupportedEntryType { path: PathBuf },

    #[error("host entry name cannot be stored in the table: {}", .path.display())]
    InvalidName { path: PathBuf },

    #[error("{0} does not fit the table format")]
    Overflow(&'static str),
}
