use byteorder::{ReadBytesExt, BE};
use std::fmt;
use std::io::Read;

use crate::error::Result;

pub const APPLOADER_HEADER_SIZE: u64 = 0x20;

const DATE_SIZE: usize = 0x10;

/// Header of the boot-stage apploader (appldr.bin).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apploader {
    /// Build date, `YYYY/MM/DD`.
    pub date: String,
    pub entrypoint: u32,
    /// Size of the apploader code following the header.
    pub size: u32,
    pub trailer_size: u32,
}

impl Apploader {
    pub fn read<R: Read>(mut reader: R) -> Result<Apploader> {
        let mut date = [0u8; DATE_SIZE];
        reader.read_exact(&mut date)?;
        let date_len = date.iter().position(|&b| b == 0).unwrap_or(DATE_SIZE);

        Ok(Apploader {
            date: String::from_utf8_lossy(&date[..date_len]).into_owned(),
            entrypoint: reader.read_u32::<BE>()?,
            size: reader.read_u32::<BE>()?,
            trailer_size: reader.read_u32::<BE>()?,
        })
    }

    /// Header plus code, in bytes.
    pub fn total_len(&self) -> u64 {
        APPLOADER_HEADER_SIZE + self.size as u64
    }
}

impl fmt::Display for Apploader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Date:       {}", self.date)?;
        writeln!(f, "Entrypoint: {:08X}", self.entrypoint)?;
        writeln!(f, "Size:       {:08X}", self.size)?;
        write!(f, "Trailer:    {:08X}", self.trailer_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_date_and_big_endian_fields() {
        let mut raw = b"2002/04/08\0\0\0\0\0\0".to_vec();
        raw.extend_from_slice(&[0x81, 0x20, 0x02, 0x50]);
        raw.extend_from_slice(&[0x00, 0x00, 0x1d, 0x60]);
        raw.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let apploader = Apploader::read(&raw[..]).unwrap();
        assert_eq!(
            apploader,
            Apploader {
                date: "2002/04/08".to_owned(),
                entrypoint: 0x8120_0250,
                size: 0x1d60,
                trailer_size: 0,
            }
        );
        assert_eq!(apploader.total_len(), 0x1d80);
        assert_eq!(
            apploader.to_string(),
            "Date:       2002/04/08\nEntrypoint: 81200250\nSize:       00001D60\nTrailer:    00000000"
        );
    }

    #[test]
    fn short_input_is_an_io_error() {
        assert!(Apploader::read(&b"2002/04/08"[..]).is_err());
    }
}
