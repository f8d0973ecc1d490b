//! The parts of a GameCube disc image (GCM) that surround the file system table.

use std::io::{self, Read, Seek, SeekFrom};

use crate::error::Result;
use crate::fst::{Fst, FstReader};

pub mod apploader;
pub mod disk_header;
pub mod region;

pub use apploader::*;
pub use disk_header::*;
pub use region::*;

pub const DISK_HEADER_OFFSET: u64 = 0x0000;
pub const DISK_HEADER_SIZE: u64 = 0x0440;
pub const DISK_HEADER_INFO_OFFSET: u64 = 0x0440;
pub const DISK_HEADER_INFO_SIZE: u64 = 0x2000;
pub const APPLOADER_OFFSET: u64 = DISK_HEADER_INFO_OFFSET + DISK_HEADER_INFO_SIZE;

pub struct GcmReader<R: Read + Seek> {
    pub disk_header: DiskHeader,
    reader: R,
}

impl<R: Read + Seek> GcmReader<R> {
    pub fn read(mut reader: R) -> Result<GcmReader<R>> {
        let disk_header = DiskHeader::read(&mut reader)?;

        log::debug!(
            "disk header: game {} maker {} fst at {:#x} ({:#x} bytes)",
            disk_header.game_code(),
            disk_header.maker(),
            disk_header.fst_offset,
            disk_header.fst_size
        );

        Ok(GcmReader {
            disk_header,
            reader,
        })
    }

    pub fn fst(&mut self) -> Result<FstReader<&mut R>> {
        FstReader::new(
            &mut self.reader,
            self.disk_header.fst_offset,
            self.disk_header.fst_size,
        )
    }

    pub fn read_table(&mut self) -> Result<Fst> {
        let fst = Fst::read(
            &mut self.reader,
            self.disk_header.fst_offset,
            self.disk_header.fst_size,
        )?;
        log::debug!("read {} fst entries", fst.entry_count());
        Ok(fst)
    }

    pub fn apploader(&mut self) -> Result<Apploader> {
        self.reader.seek(SeekFrom::Start(APPLOADER_OFFSET))?;
        Apploader::read(&mut self.reader)
    }

    /// Apploader header and code, as they would be dumped to appldr.bin.
    pub fn apploader_bytes(&mut self) -> Result<Vec<u8>> {
        let apploader = self.apploader()?;
        log::debug!("apploader: {:#x} bytes", apploader.total_len());

        self.reader.seek(SeekFrom::Start(APPLOADER_OFFSET))?;
        let mut buf = Vec::new();
        (&mut self.reader)
            .take(apploader.total_len())
            .read_to_end(&mut buf)?;
        if (buf.len() as u64) < apploader.total_len() {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::error::Error;

    fn image_with_apploader(size: u32, body_len: usize) -> Cursor<Vec<u8>> {
        let mut image = vec![0u8; APPLOADER_OFFSET as usize];
        image.extend_from_slice(b"2002/04/08\0\0\0\0\0\0");
        image.extend_from_slice(&0x8120_0250u32.to_be_bytes());
        image.extend_from_slice(&size.to_be_bytes());
        image.extend_from_slice(&0u32.to_be_bytes());
        image.resize(image.len() + 4 + body_len, 0x60);
        Cursor::new(image)
    }

    #[test]
    fn apploader_bytes_cover_header_and_code() {
        let mut gcm = GcmReader::read(image_with_apploader(0x40, 0x40)).unwrap();

        let bytes = gcm.apploader_bytes().unwrap();
        assert_eq!(bytes.len(), 0x60);
        assert_eq!(&bytes[..10], b"2002/04/08");
        assert_eq!(gcm.apploader().unwrap().size, 0x40);
    }

    #[test]
    fn truncated_apploader_is_unexpected_eof() {
        let mut gcm = GcmReader::read(image_with_apploader(0xffff_ff00, 0x10)).unwrap();

        match gcm.apploader_bytes() {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected UnexpectedEof, got {other:?}"),
        }
    }
}
