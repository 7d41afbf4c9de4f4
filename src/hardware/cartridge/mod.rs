//! Cartridge ROM/RAM and mapper (MBC) dispatch. The bus hands every access in the
//! 0x0000-0x7FFF and 0xA000-0xBFFF ranges straight to whichever [`MemoryBankController`]
//! the header selected, without knowing which mapper it actually is.

pub mod header;
mod mbc0;
mod mbc1;
mod mbc2;
mod mbc3;
mod mbc5;

use crate::error::Result;
use crate::hardware::cartridge::header::{CartridgeHeader, MbcKind};
use mbc0::Mbc0;
use mbc1::Mbc1;
use mbc2::Mbc2;
use mbc3::Mbc3;
use mbc5::Mbc5;

pub trait MemoryBankController {
    fn read_rom(&self, address: u16) -> u8;
    fn write_rom(&mut self, address: u16, value: u8);
    fn read_ram(&self, address: u16) -> u8;
    fn write_ram(&mut self, address: u16, value: u8);
    /// External RAM contents for host-side battery persistence, if this cartridge
    /// has battery-backed RAM at all.
    fn battery_ram(&self) -> Option<&[u8]>;
}

pub struct Cartridge {
    header: CartridgeHeader,
    mbc: Box<dyn MemoryBankController + Send>,
}

impl Cartridge {
    pub fn new(rom: &[u8], saved_ram: Option<Vec<u8>>) -> Result<Self> {
        let header = CartridgeHeader::parse(rom)?;
        let rom = rom.to_vec();
        let ram_size = header.ram_banks * 0x2000;
        let ram = saved_ram.unwrap_or_else(|| vec![0; ram_size]);

        let mbc: Box<dyn MemoryBankController + Send> = match header.kind.mbc {
            MbcKind::RomOnly => Box::new(Mbc0::new(rom, ram)),
            MbcKind::Mbc1 => Box::new(Mbc1::new(rom, ram, header.rom_banks)),
            MbcKind::Mbc2 => Box::new(Mbc2::new(rom, header.rom_banks, header.kind.has_battery)),
            MbcKind::Mbc3 => Box::new(Mbc3::new(rom, ram, header.rom_banks)),
            MbcKind::Mbc5 => Box::new(Mbc5::new(rom, ram, header.rom_banks)),
        };

        Ok(Cartridge { header, mbc })
    }

    #[inline]
    pub fn read_rom(&self, address: u16) -> u8 {
        self.mbc.read_rom(address)
    }

    #[inline]
    pub fn write_rom(&mut self, address: u16, value: u8) {
        self.mbc.write_rom(address, value);
    }

    #[inline]
    pub fn read_ram(&self, address: u16) -> u8 {
        self.mbc.read_ram(address)
    }

    #[inline]
    pub fn write_ram(&mut self, address: u16, value: u8) {
        self.mbc.write_ram(address, value);
    }

    pub fn battery_ram(&self) -> Option<&[u8]> {
        self.mbc.battery_ram()
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    pub fn title(&self) -> &str {
        &self.header.title
    }

    pub fn is_cgb(&self) -> bool {
        self.header.is_cgb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_rom(mapper: u8) -> Vec<u8> {
        let mut rom = vec![0u8; 0x4000 * 2];
        rom[0x147] = mapper;
        rom[0x148] = 0x00;
        rom[0x149] = 0x00;
        rom
    }

    #[test]
    fn rom_only_roundtrips() {
        let mut rom = minimal_rom(0x00);
        rom[0x10] = 0x42;
        let cart = Cartridge::new(&rom, None).unwrap();
        assert_eq!(cart.read_rom(0x10), 0x42);
    }
}
