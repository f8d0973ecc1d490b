use std::io::{Read, Seek};
use std::path::Path;

pub mod error;
pub mod fst;
pub mod gcm;

pub use error::{Error, Result};
pub use fst::{BuiltTable, Entry, Fst, StringTable, TreeBuilder};

/// Reads the file system table of a disc image, locating it through the disk header.
pub fn read_table<R: Read + Seek>(image: R) -> Result<Fst> {
    gcm::GcmReader::read(image)?.read_table()
}

/// Builds a table for a host directory with the default layout: table at offset 0,
/// file data packed right after it on 4-byte boundaries.
pub fn build_table(host_root: &Path) -> Result<BuiltTable> {
    TreeBuilder::new().build(host_root)
}

pub fn resolve_path(fst: &Fst, index: u32) -> Result<String> {
    fst.full_path(index)
}
