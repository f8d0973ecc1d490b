use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::{Entry, Fst, StringTable};

pub const DEFAULT_FILE_ALIGNMENT: u32 = 4;

/// Builds a table from a host directory tree.
///
/// Pass one walks the tree in pre-order and fixes every index, name offset and
/// end index. Pass two packs file data after the table, in the same order.
/// Hidden entries (names starting with `.`) are skipped, and siblings are
/// emitted sorted by name so that the output does not depend on the host
/// file system's listing order.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    fst_offset: u32,
    alignment: u32,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        TreeBuilder {
            fst_offset: 0,
            alignment: DEFAULT_FILE_ALIGNMENT,
        }
    }
}

/// A freshly built table together with where each file's contents come from.
#[derive(Debug, Clone)]
pub struct BuiltTable {
    pub fst: Fst,
    /// Files in packing order.
    pub sources: Vec<SourceFile>,
    /// Bytes spanned by file data, from the first file's offset to the end of the last.
    pub total_file_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub index: u32,
    pub path: PathBuf,
}

enum HostKind {
    File(u64),
    Directory,
}

struct HostEntry {
    name: String,
    path: PathBuf,
    kind: HostKind,
}

struct Frame {
    dir_index: u32,
    children: std::vec::IntoIter<HostEntry>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disc offset the table will be written at; file data is placed right after it.
    pub fn with_fst_offset(mut self, fst_offset: u32) -> Self {
        self.fst_offset = fst_offset;
        self
    }

    pub fn with_alignment(mut self, alignment: u32) -> Self {
        self.alignment = alignment.max(1);
        self
    }

    pub fn build(&self, root: &Path) -> Result<BuiltTable> {
        let mut built = scan(root)?;

        let table_end = self.fst_offset as u64 + built.fst.byte_len();
        let base_offset = u32::try_from(align_up(table_end, self.alignment))
            .map_err(|_| Error::Overflow("file data offset"))?;

        built.place_data(base_offset, self.alignment)?;
        Ok(built)
    }
}

impl BuiltTable {
    /// Assigns data offsets to every file, starting at `base_offset` and padding
    /// each file's start to `alignment`. Returns the bytes spanned by file data.
    /// On error the table is left unchanged.
    pub fn place_data(&mut self, base_offset: u32, alignment: u32) -> Result<u64> {
        let alignment = alignment.max(1);
        let mut offsets = Vec::with_capacity(self.sources.len());
        let mut position = base_offset as u64;

        for source in self.sources.iter() {
            let length = match self.fst.entry(source.index)? {
                Entry::File { data_length, .. } => *data_length,
                Entry::Directory { .. } => {
                    return Err(Error::MalformedTable {
                        index: source.index,
                        reason: "source file refers to a directory",
                    })
                }
            };

            position = align_up(position, alignment);
            let offset =
                u32::try_from(position).map_err(|_| Error::Overflow("file data offset"))?;
            offsets.push(offset);
            position += length as u64;
        }

        if position > u32::MAX as u64 + 1 {
            return Err(Error::Overflow("file data offset"));
        }

        for (source, offset) in self.sources.iter().zip(offsets) {
            if let Entry::File { data_offset, .. } = &mut self.fst.entries[source.index as usize] {
                *data_offset = offset;
            }
        }

        self.total_file_bytes = position - base_offset as u64;
        Ok(self.total_file_bytes)
    }
}

/// Pass one: the table shape and names, with every data offset left at zero.
fn scan(root: &Path) -> Result<BuiltTable> {
    let mut entries = vec![Entry::root(0)];
    let mut strings = StringTable::new();
    let mut sources = Vec::new();

    let mut stack = vec![Frame {
        dir_index: 0,
        children: list_dir(root)?.into_iter(),
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(child) = frame.children.next() else {
            let end = next_index(&entries)?;
            if let Entry::Directory { end_index, .. } = &mut entries[frame.dir_index as usize] {
                *end_index = end;
            }
            stack.pop();
            continue;
        };

        let parent_index = frame.dir_index;
        let index = next_index(&entries)?;
        let name_offset = strings.append(&child.name)?;

        match child.kind {
            HostKind::File(size) => {
                let data_length = u32::try_from(size).map_err(|_| Error::Overflow("file size"))?;
                entries.push(Entry::File {
                    name_offset,
                    data_offset: 0,
                    data_length,
                });
                sources.push(SourceFile {
                    index,
                    path: child.path,
                });
            }
            HostKind::Directory => {
                entries.push(Entry::Directory {
                    name_offset,
                    parent_index,
                    end_index: 0,
                });
                stack.push(Frame {
                    dir_index: index,
                    children: list_dir(&child.path)?.into_iter(),
                });
            }
        }
    }

    let total_file_bytes = entries
        .iter()
        .filter_map(|e| e.data_range())
        .map(|r| r.end - r.start)
        .sum();

    Ok(BuiltTable {
        fst: Fst::from_parts(entries, strings)?,
        sources,
        total_file_bytes,
    })
}

fn list_dir(path: &Path) -> Result<Vec<HostEntry>> {
    let mut children = Vec::new();

    for dir_entry in fs::read_dir(path)? {
        let dir_entry = dir_entry?;
        let file_name = dir_entry.file_name();
        let path = dir_entry.path();

        if file_name.as_encoded_bytes().first() == Some(&b'.') {
            continue;
        }

        // does not follow symlinks
        let file_type = dir_entry.file_type()?;
        let kind = if file_type.is_dir() {
            HostKind::Directory
        } else if file_type.is_file() {
            HostKind::File(dir_entry.metadata()?.len())
        } else {
            return Err(Error::UnsupportedEntryType { path });
        };

        let name = match file_name.to_str() {
            Some(name) if !name.contains(['\0', '/']) => name.to_owned(),
            _ => return Err(Error::InvalidName { path }),
        };

        children.push(HostEntry { name, path, kind });
    }

    children.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(children)
}

fn next_index(entries: &[Entry]) -> Result<u32> {
    u32::try_from(entries.len()).map_err(|_| Error::Overflow("entry count"))
}

fn align_up(value: u64, alignment: u32) -> u64 {
    value.next_multiple_of(alignment.max(1) as u64)
}
