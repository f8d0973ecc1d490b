use byteorder::{ReadBytesExt, BE};
use std::io::{Cursor, Read, Seek, SeekFrom};

use crate::error::Result;

use super::region::Region;
use super::*;

const GAME_NAME_OFFSET: u64 = 0x20;
const GAME_NAME_SIZE: usize = 0x3e0;
const DOL_OFFSET_OFFSET: u64 = 0x420;

/// The boot.bin block at the start of every image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskHeader {
    pub system_id: u8,
    pub game_id: [u8; 2],
    pub region_code: u8,
    pub maker_code: [u8; 2],
    pub disc_number: u8,
    pub version: u8,
    pub game_name: String,
    pub dol_offset: u32,
    pub fst_offset: u32,
    pub fst_size: u32,
    pub fst_max_size: u32,
}

impl DiskHeader {
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<DiskHeader> {
        reader.seek(SeekFrom::Start(DISK_HEADER_OFFSET))?;

        let mut raw = vec![0u8; DISK_HEADER_SIZE as usize];
        reader.read_exact(&mut raw)?;
        let mut cursor = Cursor::new(&raw);

        let system_id = cursor.read_u8()?;
        let mut game_id = [0u8; 2];
        cursor.read_exact(&mut game_id)?;
        let region_code = cursor.read_u8()?;
        let mut maker_code = [0u8; 2];
        cursor.read_exact(&mut maker_code)?;
        let disc_number = cursor.read_u8()?;
        let version = cursor.read_u8()?;

        let name = &raw[GAME_NAME_OFFSET as usize..][..GAME_NAME_SIZE];
        let name_len = name.iter().position(|&b| b == 0).unwrap_or(GAME_NAME_SIZE);
        let game_name = String::from_utf8_lossy(&name[..name_len]).into_owned();

        cursor.seek(SeekFrom::Start(DOL_OFFSET_OFFSET))?;
        let dol_offset = cursor.read_u32::<BE>()?;
        let fst_offset = cursor.read_u32::<BE>()?;
        let fst_size = cursor.read_u32::<BE>()?;
        let fst_max_size = cursor.read_u32::<BE>()?;

        Ok(DiskHeader {
            system_id,
            game_id,
            region_code,
            maker_code,
            disc_number,
            version,
            game_name,
            dol_offset,
            fst_offset,
            fst_size,
            fst_max_size,
        })
    }

    /// System id, game id and region code, e.g. `GALE`.
    pub fn game_code(&self) -> String {
        let code = [
            self.system_id,
            self.game_id[0],
            self.game_id[1],
            self.region_code,
        ];
        String::from_utf8_lossy(&code).into_owned()
    }

    pub fn maker(&self) -> String {
        String::from_utf8_lossy(&self.maker_code).into_owned()
    }

    pub fn region(&self) -> Option<Region> {
        Region::try_from(self.region_code).ok()
    }
}
