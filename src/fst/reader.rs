use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::error::{Error, Result};

use super::{Entry, Fst, ENTRY_SIZE};

const NAME_CHUNK: usize = 0x100;

/// Reads entries straight out of a disc image without loading the whole table.
pub struct FstReader<R: Read + Seek> {
    reader: R,
    fst_offset: u32,
    fst_size: u32,
    entry_count: u32,
}

impl<R: Read + Seek> FstReader<R> {
    pub fn new(mut reader: R, fst_offset: u32, fst_size: u32) -> Result<FstReader<R>> {
        reader.seek(SeekFrom::Start(fst_offset as u64))?;

        let entry_count = match Entry::read(&mut reader)? {
            Entry::Directory { end_index, .. } => end_index,
            Entry::File { .. } => {
                return Err(Error::MalformedTable {
                    index: 0,
                    reason: "root entry is not a directory",
                })
            }
        };

        if entry_count == 0 || entry_count as u64 * ENTRY_SIZE as u64 > fst_size as u64 {
            return Err(Error::MalformedTable {
                index: 0,
                reason: "entry count does not fit the FST size",
            });
        }

        Ok(FstReader {
            reader,
            fst_offset,
            fst_size,
            entry_count,
        })
    }

    pub fn entry_count(&self) -> u32 {
        self.entry_count
    }

    fn string_table_offset(&self) -> u64 {
        self.fst_offset as u64 + self.entry_count as u64 * ENTRY_SIZE as u64
    }

    fn string_table_len(&self) -> u64 {
        self.fst_size as u64 - self.entry_count as u64 * ENTRY_SIZE as u64
    }

    pub fn entry_at(&mut self, index: u32) -> Result<Entry> {
        if index >= self.entry_count {
            return Err(Error::InvalidIndex {
                index,
                count: self.entry_count,
            });
        }

        let position = self.fst_offset as u64 + index as u64 * ENTRY_SIZE as u64;
        self.reader.seek(SeekFrom::Start(position))?;
        Ok(Entry::read(&mut self.reader)?)
    }

    pub fn name_at(&mut self, index: u32) -> Result<String> {
        let entry = self.entry_at(index)?;
        if index == 0 {
            return Ok(String::new());
        }

        let table_len = self.string_table_len();
        let offset = entry.name_offset();
        if offset as u64 >= table_len {
            return Err(Error::OutOfRange {
                offset,
                len: table_len as usize,
            });
        }

        self.reader
            .seek(SeekFrom::Start(self.string_table_offset() + offset as u64))?;

        let mut remaining = table_len - offset as u64;
        let mut name = Vec::new();
        let mut chunk = [0u8; NAME_CHUNK];

        while remaining > 0 {
            let len = remaining.min(NAME_CHUNK as u64) as usize;
            self.reader.read_exact(&mut chunk[..len])?;
            remaining -= len as u64;

            if let Some(end) = chunk[..len].iter().position(|&b| b == 0) {
                name.extend_from_slice(&chunk[..end]);
                break;
            }
            name.extend_from_slice(&chunk[..len]);
        }

        Ok(String::from_utf8_lossy(&name).into_owned())
    }

    /// Lazily yields the immediate children of a directory, reading one record per child.
    /// Calling this again restarts the sequence.
    pub fn children_of(&mut self, dir_index: u32) -> Result<ChildEntries<'_, R>> {
        let end = match self.entry_at(dir_index)? {
            Entry::Directory { end_index, .. } => end_index.min(self.entry_count),
            Entry::File { .. } => dir_index + 1,
        };

        Ok(ChildEntries {
            fst: self,
            next: dir_index + 1,
            end,
        })
    }

    /// Copies a file's contents from the image into `w`, returning the byte count.
    pub fn read_file<W: Write>(&mut self, index: u32, mut w: W) -> Result<u64> {
        let range = self
            .entry_at(index)?
            .data_range()
            .ok_or(Error::InvalidIndex {
                index,
                count: self.entry_count,
            })?;

        self.reader.seek(SeekFrom::Start(range.start))?;

        let len = range.end - range.start;
        let copied = io::copy(&mut self.reader.by_ref().take(len), &mut w)?;
        if copied < len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }

        Ok(copied)
    }

    /// Loads the whole entry table and string table.
    pub fn read_table(&mut self) -> Result<Fst> {
        Fst::read(&mut self.reader, self.fst_offset, self.fst_size)
    }
}

pub struct ChildEntries<'a, R: Read + Seek> {
    fst: &'a mut FstReader<R>,
    next: u32,
    end: u32,
}

impl<R: Read + Seek> Iterator for ChildEntries<'_, R> {
    type Item = Result<(u32, Entry)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }

        let index = self.next;
        match self.fst.entry_at(index) {
            Ok(entry) => {
                self.next = match entry {
                    Entry::Directory { end_index, .. } => end_index.max(index + 1),
                    Entry::File { .. } => index + 1,
                };
                Some(Ok((index, entry)))
            }
            Err(e) => {
                self.next = self.end;
                Some(Err(e))
            }
        }
    }
}
