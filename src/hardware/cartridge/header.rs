//! Decodes the cartridge header at 0x0100-0x014F: the mapper byte, ROM/RAM bank
//! counts, and whether the cartridge carries battery-backed RAM.

use crate::error::{Error, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MbcKind {
    RomOnly,
    Mbc1,
    Mbc2,
    Mbc3,
    Mbc5,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CartridgeKind {
    pub mbc: MbcKind,
    pub has_ram: bool,
    pub has_battery: bool,
}

impl CartridgeKind {
    fn new(mbc: MbcKind, has_ram: bool, has_battery: bool) -> Self {
        CartridgeKind {
            mbc,
            has_ram,
            has_battery,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self> {
        use MbcKind::*;
        Ok(match byte {
            0x00 => CartridgeKind::new(RomOnly, false, false),
            0x01 => CartridgeKind::new(Mbc1, false, false),
            0x02 => CartridgeKind::new(Mbc1, true, false),
            0x03 => CartridgeKind::new(Mbc1, true, true),
            0x05 => CartridgeKind::new(Mbc2, true, false),
            0x06 => CartridgeKind::new(Mbc2, true, true),
            0x08 => CartridgeKind::new(RomOnly, true, false),
            0x09 => CartridgeKind::new(RomOnly, true, true),
            0x0F => CartridgeKind::new(Mbc3, false, true),
            0x10 => CartridgeKind::new(Mbc3, true, true),
            0x11 => CartridgeKind::new(Mbc3, false, false),
            0x12 => CartridgeKind::new(Mbc3, true, false),
            0x13 => CartridgeKind::new(Mbc3, true, true),
            0x19 => CartridgeKind::new(Mbc5, false, false),
            0x1A => CartridgeKind::new(Mbc5, true, false),
            0x1B => CartridgeKind::new(Mbc5, true, true),
            0x1C => CartridgeKind::new(Mbc5, false, false),
            0x1D => CartridgeKind::new(Mbc5, true, false),
            0x1E => CartridgeKind::new(Mbc5, true, true),
            _ => return Err(Error::UnsupportedMapper(byte)),
        })
    }
}

/// ROM size byte 0x0148: "32KB << N", in banks of 0x4000 bytes.
pub fn rom_banks(byte: u8) -> Result<usize> {
    match byte {
        0x00..=0x08 => Ok(2usize << byte as u32),
        _ => Err(Error::BadImage(format!("unsupported rom size byte 0x{:02X}", byte))),
    }
}

/// RAM size byte 0x0149, in banks of 0x2000 bytes.
pub fn ram_banks(byte: u8) -> Result<usize> {
    match byte {
        0x00 => Ok(0),
        0x01 => Ok(1), // 2 KiB, a partial bank; handled as one short bank by the MBC.
        0x02 => Ok(1),
        0x03 => Ok(4),
        0x04 => Ok(16),
        0x05 => Ok(8),
        _ => Err(Error::BadImage(format!("unsupported ram size byte 0x{:02X}", byte))),
    }
}

#[derive(Debug, Clone)]
pub struct CartridgeHeader {
    pub title: String,
    pub kind: CartridgeKind,
    pub rom_banks: usize,
    pub ram_banks: usize,
    pub is_cgb: bool,
}

impl CartridgeHeader {
    pub fn parse(rom: &[u8]) -> Result<Self> {
        if rom.len() < 0x150 {
            return Err(Error::BadImage("shorter than the header region".into()));
        }

        let has_short_title = rom[0x143] == 0x80 || rom[0x143] == 0xC0;
        let title_end = if has_short_title { 0x13E } else { 0x143 };
        let title = rom[0x134..=title_end]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect();

        let kind = CartridgeKind::from_byte(rom[0x147])?;
        let rom_banks = rom_banks(rom[0x148])?;
        let ram_banks = ram_banks(rom[0x149])?;

        if rom.len() < rom_banks * 0x4000 {
            return Err(Error::BadImage(format!(
                "rom image is {} bytes, header declares {} banks ({} bytes)",
                rom.len(),
                rom_banks,
                rom_banks * 0x4000
            )));
        }

        Ok(CartridgeHeader {
            title,
            kind,
            rom_banks,
            ram_banks,
            is_cgb: rom[0x143] & 0x80 != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom_with_header(mapper: u8, rom_size: u8, ram_size: u8) -> Vec<u8> {
        let mut rom = vec![0u8; 0x4000 * 2];
        rom[0x147] = mapper;
        rom[0x148] = rom_size;
        rom[0x149] = ram_size;
        rom
    }

    #[test]
    fn parses_mbc1_ram_battery() {
        let rom = rom_with_header(0x03, 0x00, 0x02);
        let header = CartridgeHeader::parse(&rom).unwrap();
        assert_eq!(header.kind.mbc, MbcKind::Mbc1);
        assert!(header.kind.has_ram);
        assert!(header.kind.has_battery);
        assert_eq!(header.ram_banks, 1);
    }

    #[test]
    fn rejects_unknown_mapper() {
        let rom = rom_with_header(0x22, 0x00, 0x00);
        assert!(matches!(
            CartridgeHeader::parse(&rom),
            Err(Error::UnsupportedMapper(0x22))
        ));
    }

    #[test]
    fn rejects_undersized_rom() {
        let rom = rom_with_header(0x00, 0x02, 0x00); // declares 8 banks, image has 2
        assert!(matches!(CartridgeHeader::parse(&rom), Err(Error::BadImage(_))));
    }
}
