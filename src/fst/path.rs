use crate::error::{Error, Result};

use super::{Entry, Fst};

impl Fst {
    /// Absolute path of any entry. The root resolves to `/`.
    ///
    /// Files carry no parent index, so a file's directory is found by descending
    /// from the root; use [`Fst::file_path`] when the directory is already known.
    pub fn full_path(&self, index: u32) -> Result<String> {
        match self.entry(index)? {
            Entry::Directory { .. } => self.dir_path(index),
            Entry::File { .. } => {
                let dir_index = self.parent_of(index)?;
                self.file_path(dir_index, index)
            }
        }
    }

    /// Path of the entry at `index`, which must be an immediate child of the directory
    /// at `dir_index`.
    pub fn file_path(&self, dir_index: u32, index: u32) -> Result<String> {
        let count = self.entry_count();
        if self.entry(dir_index)?.end_index().is_none() {
            return Err(Error::InvalidIndex {
                index: dir_index,
                count,
            });
        }

        if index >= count || !self.children(dir_index)?.any(|child| child == index) {
            return Err(Error::InvalidIndex { index, count });
        }

        let mut path = self.dir_path(dir_index)?;
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(&self.name(index)?);
        Ok(path)
    }

    /// Index of the directory that immediately contains `index`. The root is its own parent.
    pub fn parent_of(&self, index: u32) -> Result<u32> {
        match *self.entry(index)? {
            _ if index == 0 => Ok(0),
            Entry::Directory { parent_index, .. } if parent_index < self.entry_count() => {
                Ok(parent_index)
            }
            Entry::Directory { .. } => Err(Error::MalformedTable {
                index,
                reason: "parent index is outside the table",
            }),
            Entry::File { .. } => self.containing_dir(index),
        }
    }

    fn containing_dir(&self, index: u32) -> Result<u32> {
        let mut dir_index = 0;

        // each step moves to a strictly greater index, so this terminates
        'descend: loop {
            for child in self.children(dir_index)? {
                if child == index {
                    return Ok(dir_index);
                }

                if let Entry::Directory { end_index, .. } = self.entries()[child as usize] {
                    if child < index && index < end_index {
                        dir_index = child;
                        continue 'descend;
                    }
                }
            }

            return Err(Error::MalformedTable {
                index,
                reason: "entry is not reachable from the root",
            });
        }
    }

    fn dir_path(&self, index: u32) -> Result<String> {
        let count = self.entry_count();
        let mut components = Vec::new();
        let mut current = index;
        let mut steps = 0;

        while current != 0 {
            if steps >= count {
                return Err(Error::MalformedTable {
                    index,
                    reason: "parent chain does not reach the root",
                });
            }
            steps += 1;

            match self.entries().get(current as usize) {
                Some(&Entry::Directory {
                    name_offset,
                    parent_index,
                    ..
                }) => {
                    components.push(self.strings().read_at(name_offset)?);
                    current = parent_index;
                }
                Some(Entry::File { .. }) => {
                    return Err(Error::MalformedTable {
                        index: current,
                        reason: "parent is not a directory",
                    })
                }
                None => {
                    return Err(Error::MalformedTable {
                        index,
                        reason: "parent index is outside the table",
                    })
                }
            }
        }

        components.reverse();
        Ok(format!("/{}", components.join("/")))
    }
}
