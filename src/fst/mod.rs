//! The GameCube file system table: a flat, pre-order array of 12-byte records
//! followed by a string table holding every entry's name.
//!
//! Directories do not point at their children. A directory at index `i` owns
//! every entry in `i + 1 .. end_index`, and each nested directory records the
//! index of its parent, so the tree is walked with index arithmetic alone.

use std::borrow::Cow;
use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::error::{Error, Result};

pub mod builder;
pub mod entry;
pub mod path;
pub mod reader;
pub mod string_table;

pub use builder::*;
pub use entry::*;
pub use reader::*;
pub use string_table::*;

/// A flat entry table paired with its string table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fst {
    entries: Vec<Entry>,
    strings: StringTable,
}

impl Fst {
    /// Pairs an entry table with its string table, checking the root invariants.
    pub fn from_parts(entries: Vec<Entry>, strings: StringTable) -> Result<Fst> {
        let count = u32::try_from(entries.len()).map_err(|_| Error::Overflow("entry count"))?;

        match entries.first() {
            Some(&Entry::Directory { end_index, .. }) if end_index == count => {}
            Some(Entry::Directory { .. }) => {
                return Err(Error::MalformedTable {
                    index: 0,
                    reason: "root end index does not match the entry count",
                })
            }
            _ => {
                return Err(Error::MalformedTable {
                    index: 0,
                    reason: "root entry is not a directory",
                })
            }
        }

        Ok(Fst { entries, strings })
    }

    /// Reads a whole table from `fst_size` bytes at `fst_offset`.
    pub fn read<R: Read + Seek>(mut r: R, fst_offset: u32, fst_size: u32) -> Result<Fst> {
        r.seek(SeekFrom::Start(fst_offset as u64))?;

        let root = Entry::read(&mut r)?;
        let count = match root {
            Entry::Directory { end_index, .. } => end_index,
            Entry::File { .. } => {
                return Err(Error::MalformedTable {
                    index: 0,
                    reason: "root entry is not a directory",
                })
            }
        };

        let entries_len = count as u64 * ENTRY_SIZE as u64;
        if count == 0 || entries_len > fst_size as u64 {
            return Err(Error::MalformedTable {
                index: 0,
                reason: "entry count does not fit the FST size",
            });
        }

        let mut entries = Vec::with_capacity(count.min(0x1_0000) as usize);
        entries.push(root);
        for _ in 1..count {
            entries.push(Entry::read(&mut r)?);
        }

        let strings_len = fst_size as u64 - entries_len;
        let mut strings = Vec::new();
        r.take(strings_len).read_to_end(&mut strings)?;
        if (strings.len() as u64) < strings_len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }

        Ok(Fst {
            entries,
            strings: StringTable::from_bytes(strings),
        })
    }

    /// Writes the records followed by the string table.
    pub fn write<W: Write>(&self, mut w: W) -> io::Result<()> {
        for entry in self.entries.iter() {
            entry.write(&mut w)?;
        }
        w.write_all(self.strings.as_bytes())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.byte_len() as usize);
        buf.extend(self.entries.iter().flat_map(|e| e.encode()));
        buf.extend_from_slice(self.strings.as_bytes());
        buf
    }

    /// Serialized size in bytes, i.e. the value stored as the FST size in the disk header.
    pub fn byte_len(&self) -> u64 {
        (self.entries.len() * ENTRY_SIZE + self.strings.len()) as u64
    }

    pub fn entry_count(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    pub fn entry(&self, index: u32) -> Result<&Entry> {
        self.entries.get(index as usize).ok_or(Error::InvalidIndex {
            index,
            count: self.entry_count(),
        })
    }

    /// The root has no name of its own; its name offset is ignored.
    pub fn name(&self, index: u32) -> Result<Cow<'_, str>> {
        let entry = self.entry(index)?;
        if index == 0 {
            return Ok(Cow::Borrowed(""));
        }
        self.strings.read_at(entry.name_offset())
    }

    /// Immediate children of a directory, skipping nested subtrees by their end index.
    /// A file has no children.
    pub fn children(&self, dir_index: u32) -> Result<Children<'_>> {
        let entry = self.entry(dir_index)?;
        let end = entry
            .end_index()
            .unwrap_or(dir_index + 1)
            .min(self.entry_count());

        Ok(Children {
            entries: &self.entries,
            next: dir_index + 1,
            end,
        })
    }

    /// Calls `f` with the index, absolute path and record of every entry below the root,
    /// in table order.
    pub fn walk(&self, mut f: impl FnMut(u32, &str, &Entry)) -> Result<()> {
        let mut dirs: Vec<(u32, String)> = vec![(self.entry_count(), String::new())];

        for (index, entry) in self.entries.iter().enumerate().skip(1) {
            let index = index as u32;

            while dirs.len() > 1 && dirs.last().is_some_and(|(end, _)| index >= *end) {
                dirs.pop();
            }

            let parent = dirs.last().map(|(_, path)| path.as_str()).unwrap_or("");
            let path = format!("{}/{}", parent, self.name(index)?);

            f(index, &path, entry);

            if let Entry::Directory { end_index, .. } = *entry {
                dirs.push((end_index, path));
            }
        }

        Ok(())
    }

    /// Looks up an absolute `/`-separated path. Names compare case-sensitively.
    pub fn find(&self, path: &str) -> Result<Option<u32>> {
        let mut current = 0;

        'components: for component in path.split('/').filter(|s| !s.is_empty()) {
            for child in self.children(current)? {
                if self.name(child)? == component {
                    current = child;
                    continue 'components;
                }
            }
            return Ok(None);
        }

        Ok(Some(current))
    }
}

#[derive(Debug, Clone)]
pub struct Children<'a> {
    entries: &'a [Entry],
    next: u32,
    end: u32,
}

impl Iterator for Children<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.next >= self.end {
            return None;
        }

        let index = self.next;
        self.next = match self.entries[index as usize] {
            Entry::Directory { end_index, .. } => end_index.max(index + 1),
            Entry::File { .. } => index + 1,
        };

        Some(index)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn file(name_offset: u32, data_offset: u32, data_length: u32) -> Entry {
        Entry::File {
            name_offset,
            data_offset,
            data_length,
        }
    }

    pub(crate) fn dir(name_offset: u32, parent_index: u32, end_index: u32) -> Entry {
        Entry::Directory {
            name_offset,
            parent_index,
            end_index,
        }
    }

    /// ```text
    /// /
    /// ├── a.txt
    /// ├── sub/
    /// │   ├── b.txt
    /// │   └── deep/
    /// │       └── c.bin
    /// └── z.dat
    /// ```
    pub(crate) fn sample() -> Fst {
        let mut strings = StringTable::new();
        let a = strings.append("a.txt").unwrap();
        let sub = strings.append("sub").unwrap();
        let b = strings.append("b.txt").unwrap();
        let deep = strings.append("deep").unwrap();
        let c = strings.append("c.bin").unwrap();
        let z = strings.append("z.dat").unwrap();

        let entries = vec![
            dir(0, 0, 7),
            file(a, 0x1000, 4),
            dir(sub, 0, 6),
            file(b, 0x1004, 0),
            dir(deep, 2, 6),
            file(c, 0x1004, 16),
            file(z, 0x1014, 2),
        ];

        Fst::from_parts(entries, strings).unwrap()
    }

    #[test]
    fn children_skip_nested_subtrees() {
        let fst = sample();
        assert_eq!(fst.children(0).unwrap().collect::<Vec<_>>(), [1, 2, 6]);
        assert_eq!(fst.children(2).unwrap().collect::<Vec<_>>(), [3, 4]);
        assert_eq!(fst.children(4).unwrap().collect::<Vec<_>>(), [5]);
        assert_eq!(fst.children(1).unwrap().count(), 0);
        assert!(matches!(
            fst.children(7),
            Err(Error::InvalidIndex { index: 7, count: 7 })
        ));
    }

    #[test]
    fn children_are_restartable() {
        let fst = sample();
        let children = fst.children(0).unwrap();
        let first: Vec<_> = children.clone().collect();
        let second: Vec<_> = children.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn walk_yields_paths_in_table_order() {
        let fst = sample();
        let mut seen = Vec::new();
        fst.walk(|index, path, _| seen.push((index, path.to_owned()))).unwrap();

        assert_eq!(
            seen,
            [
                (1, "/a.txt".to_owned()),
                (2, "/sub".to_owned()),
                (3, "/sub/b.txt".to_owned()),
                (4, "/sub/deep".to_owned()),
                (5, "/sub/deep/c.bin".to_owned()),
                (6, "/z.dat".to_owned()),
            ]
        );
    }

    #[test]
    fn find_descends_by_name() {
        let fst = sample();
        assert_eq!(fst.find("/").unwrap(), Some(0));
        assert_eq!(fst.find("/sub/deep/c.bin").unwrap(), Some(5));
        assert_eq!(fst.find("z.dat").unwrap(), Some(6));
        assert_eq!(fst.find("/sub/c.bin").unwrap(), None);
        assert_eq!(fst.find("/SUB").unwrap(), None);
    }

    #[test]
    fn bytes_read_back_identically() {
        let fst = sample();
        let bytes = fst.to_bytes();
        assert_eq!(bytes.len() as u64, fst.byte_len());

        let mut written = Vec::new();
        fst.write(&mut written).unwrap();
        assert_eq!(written, bytes);

        let mut image = vec![0xaa; 0x40];
        image.extend_from_slice(&bytes);
        let read = Fst::read(io::Cursor::new(image), 0x40, bytes.len() as u32).unwrap();
        assert_eq!(read, fst);
    }

    #[test]
    fn read_rejects_counts_larger_than_the_fst() {
        let bytes = Entry::root(100).encode();
        assert!(matches!(
            Fst::read(io::Cursor::new(bytes.to_vec()), 0, ENTRY_SIZE as u32),
            Err(Error::MalformedTable { index: 0, .. })
        ));
    }

    #[test]
    fn from_parts_checks_the_root() {
        let strings = StringTable::new();
        assert!(Fst::from_parts(vec![Entry::root(1)], strings.clone()).is_ok());
        assert!(Fst::from_parts(vec![Entry::root(2)], strings.clone()).is_err());
        assert!(Fst::from_parts(vec![file(0, 0, 0)], strings.clone()).is_err());
        assert!(Fst::from_parts(Vec::new(), strings).is_err());
    }
}
