//! The 256-byte DMG boot ROM is mapped at 0x0000-0x00FF until the program itself
//! disables it by writing to 0xFF50; after that the same address range reads from
//! the cartridge instead. This crate never ships Nintendo's boot ROM bytes; a host
//! wishing to emulate the boot sequence supplies its own dump via
//! [`crate::EmulatorOptions::boot_rom`].

#[derive(Debug, Clone)]
pub struct BootRom {
    rom: Option<Box<[u8; 256]>>,
    active: bool,
}

impl BootRom {
    pub fn new(rom: Option<[u8; 256]>) -> Self {
        BootRom {
            active: rom.is_some(),
            rom: rom.map(Box::new),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn read(&self, address: u16) -> u8 {
        self.rom
            .as_ref()
            .map(|rom| rom[address as usize])
            .unwrap_or(0xFF)
    }

    /// Write to the 0xFF50 boot-ROM-disable register. Any write permanently disables
    /// the boot ROM for the rest of this session; it can't be turned back on.
    pub fn write_disable(&mut self, _value: u8) {
        self.active = false;
    }
}
