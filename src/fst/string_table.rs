use std::borrow::Cow;

use crate::error::{Error, Result};

use super::entry::MAX_NAME_OFFSET;

/// Concatenated NUL-terminated names. Offsets are relative to the table start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    bytes: Vec<u8>,
}

impl StringTable {
    pub fn new() -> StringTable {
        StringTable::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> StringTable {
        StringTable { bytes }
    }

    /// Appends `name` and its terminator, returning the offset it was written at.
    /// Identical names are not deduplicated.
    pub fn append(&mut self, name: &str) -> Result<u32> {
        let offset = self.bytes.len();
        if offset > MAX_NAME_OFFSET as usize {
            return Err(Error::Overflow("string table size"));
        }

        self.bytes.extend_from_slice(name.as_bytes());
        self.bytes.push(0);

        Ok(offset as u32)
    }

    /// Returns the name starting at `offset`, up to its terminator or the end of the table.
    pub fn read_at(&self, offset: u32) -> Result<Cow<'_, str>> {
        let tail = self
            .bytes
            .get(offset as usize..)
            .filter(|tail| !tail.is_empty())
            .ok_or(Error::OutOfRange {
                offset,
                len: self.bytes.len(),
            })?;

        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        Ok(String::from_utf8_lossy(&tail[..end]))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
