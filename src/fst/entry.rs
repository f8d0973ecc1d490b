use byteorder::{ByteOrder, BE};
use std::io::{self, Read, Write};

pub const ENTRY_SIZE: usize = 12;

pub const FLAG_FILE: u8 = 0;
pub const FLAG_DIRECTORY: u8 = 1;

/// Largest value the 24-bit name offset field can hold.
pub const MAX_NAME_OFFSET: u32 = 0x00ff_ffff;

/// One 12-byte FST record.
///
/// ```text
/// 0x00  1  flags: 0 = file, 1 = directory
/// 0x01  3  name offset, relative to the string table
/// 0x04  4  file: data offset  / dir: parent index
/// 0x08  4  file: data length  / dir: end index
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    File {
        name_offset: u32,
        data_offset: u32,
        data_length: u32,
    },
    Directory {
        name_offset: u32,
        parent_index: u32,
        end_index: u32,
    },
}

impl Entry {
    pub fn root(entry_count: u32) -> Entry {
        Entry::Directory {
            name_offset: 0,
            parent_index: 0,
            end_index: entry_count,
        }
    }

    pub fn decode(raw: &[u8; ENTRY_SIZE]) -> Entry {
        let is_dir = raw[0] != FLAG_FILE;

        // the flag shares the first word with the offset
        let name_offset = BE::read_u32(&raw[0..4]) & MAX_NAME_OFFSET;
        let field2 = BE::read_u32(&raw[4..8]);
        let field3 = BE::read_u32(&raw[8..12]);

        if is_dir {
            Entry::Directory {
                name_offset,
                parent_index: field2,
                end_index: field3,
            }
        } else {
            Entry::File {
                name_offset,
                data_offset: field2,
                data_length: field3,
            }
        }
    }

    /// Name offsets are stored in 24 bits; anything above [`MAX_NAME_OFFSET`] is masked off.
    pub fn encode(&self) -> [u8; ENTRY_SIZE] {
        let (flag, name_offset, field2, field3) = match *self {
            Entry::File {
                name_offset,
                data_offset,
                data_length,
            } => (FLAG_FILE, name_offset, data_offset, data_length),
            Entry::Directory {
                name_offset,
                parent_index,
                end_index,
            } => (FLAG_DIRECTORY, name_offset, parent_index, end_index),
        };
        debug_assert!(
            name_offset <= MAX_NAME_OFFSET,
            "name offset {name_offset:#x} does not fit in 24 bits"
        );

        let mut raw = [0u8; ENTRY_SIZE];
        BE::write_u32(
            &mut raw[0..4],
            ((flag as u32) << 24) | (name_offset & MAX_NAME_OFFSET),
        );
        BE::write_u32(&mut raw[4..8], field2);
        BE::write_u32(&mut raw[8..12], field3);
        raw
    }

    pub fn read<R: Read>(mut r: R) -> io::Result<Entry> {
        let mut raw = [0u8; ENTRY_SIZE];
        r.read_exact(&mut raw)?;
        Ok(Entry::decode(&raw))
    }

    pub fn write<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_all(&self.encode())
    }

    pub fn name_offset(&self) -> u32 {
        match *self {
            Entry::File { name_offset, .. } | Entry::Directory { name_offset, .. } => name_offset,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Entry::Directory { .. })
    }

    pub fn end_index(&self) -> Option<u32> {
        match *self {
            Entry::Directory { end_index, .. } => Some(end_index),
            Entry::File { .. } => None,
        }
    }

    pub fn parent_index(&self) -> Option<u32> {
        match *self {
            Entry::Directory { parent_index, .. } => Some(parent_index),
            Entry::File { .. } => None,
        }
    }

    /// Byte range of a file's contents within the disc image.
    pub fn data_range(&self) -> Option<std::ops::Range<u64>> {
        match *self {
            Entry::File {
                data_offset,
                data_length,
                ..
            } => {
                let start = data_offset as u64;
                Some(start..start + data_length as u64)
            }
            Entry::Directory { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_file_record() {
        let raw = [
            0x00, 0x00, 0x01, 0x2c, 0x00, 0x12, 0x34, 0x00, 0x00, 0x00, 0x10, 0x00,
        ];
        assert_eq!(
            Entry::decode(&raw),
            Entry::File {
                name_offset: 0x12c,
                data_offset: 0x123400,
                data_length: 0x1000,
            }
        );
    }

    #[test]
    fn directory_flag_does_not_leak_into_name_offset() {
        let raw = [
            0x01, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x07,
        ];
        assert_eq!(
            Entry::decode(&raw),
            Entry::Directory {
                name_offset: 5,
                parent_index: 2,
                end_index: 7,
            }
        );
    }

    #[test]
    fn any_nonzero_flag_is_a_directory() {
        let mut raw = Entry::root(3).encode();
        raw[0] = 0xff;
        assert_eq!(Entry::decode(&raw), Entry::root(3));
    }

    #[test]
    fn encode_packs_flag_and_offset_big_endian() {
        let dir = Entry::Directory {
            name_offset: 0xabcdef,
            parent_index: 1,
            end_index: 0x0102_0304,
        };
        assert_eq!(
            dir.encode(),
            [0x01, 0xab, 0xcd, 0xef, 0, 0, 0, 1, 0x01, 0x02, 0x03, 0x04]
        );

        let file = Entry::File {
            name_offset: 0xffffff,
            data_offset: 0xdead_beef,
            data_length: 0,
        };
        assert_eq!(Entry::decode(&file.encode()), file);
        assert_eq!(Entry::decode(&dir.encode()), dir);
    }

    #[test]
    fn reads_and_writes_through_streams() {
        let entry = Entry::File {
            name_offset: 9,
            data_offset: 0x8000,
            data_length: 4,
        };

        let mut buf = Vec::new();
        entry.write(&mut buf).unwrap();
        assert_eq!(buf.len(), ENTRY_SIZE);
        assert_eq!(Entry::read(&buf[..]).unwrap(), entry);

        assert!(Entry::read(&buf[..ENTRY_SIZE - 1]).is_err());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "does not fit in 24 bits")]
    fn encode_asserts_name_offset_fits() {
        Entry::File {
            name_offset: MAX_NAME_OFFSET + 1,
            data_offset: 0,
            data_length: 0,
        }
        .encode();
    }
}
