use std::fmt;

use num_enum::TryFromPrimitive;

/// Fourth character of the game code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum Region {
    Germany = 0x44,
    Usa = 0x45,
    France = 0x46,
    Japan = 0x4a,
    Europe = 0x50,
}

impl Region {
    pub fn is_pal(self) -> bool {
        matches!(self, Region::Germany | Region::France | Region::Europe)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Region::Germany => "Germany (PAL)",
            Region::Usa => "USA (NTSC-U)",
            Region::France => "France (PAL)",
            Region::Japan => "Japan (NTSC-J)",
            Region::Europe => "Europe (PAL)",
        };
        f.write_str(name)
    }
}
