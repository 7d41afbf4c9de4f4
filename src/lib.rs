pub mod error;
pub mod gameboy;
pub mod hardware;

pub use crate::error::Error;
pub use crate::gameboy::{EmulatorMode, GameBoy};
pub use crate::hardware::joypad::InputKey;
pub use crate::hardware::ppu::palette::{DisplayColour, DmgColor, RGB};

/// Options controlling how a [`GameBoy`](crate::gameboy::GameBoy) is constructed.
///
/// Mirrors the builder pattern used throughout this crate for any struct with more than
/// a couple of optional knobs.
#[derive(Debug, Default)]
pub struct EmulatorOptions {
    /// An optional boot ROM image. Without one the emulator starts directly at cartridge
    /// entry point 0x100 with post-boot register/memory state, as real hardware would
    /// have left it.
    pub boot_rom: Option<[u8; 256]>,
    /// Previously saved external (cartridge) RAM, for cartridges with a battery.
    pub saved_ram: Option<Vec<u8>>,
    /// Which hardware variant to emulate.
    pub emulator_mode: EmulatorMode,
    /// Colours to use for the DMG palette renderer.
    pub display_colour: DisplayColour,
}

#[derive(Debug, Default)]
pub struct EmulatorOptionsBuilder {
    boot_rom: Option<[u8; 256]>,
    saved_ram: Option<Vec<u8>>,
    emulator_mode: EmulatorMode,
    display_colour: DisplayColour,
}

impl EmulatorOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boot_rom(mut self, boot_rom: Option<[u8; 256]>) -> Self {
        self.boot_rom = boot_rom;
        self
    }

    pub fn saved_ram(mut self, saved_ram: Option<Vec<u8>>) -> Self {
        self.saved_ram = saved_ram;
        self
    }

    pub fn with_mode(mut self, mode: EmulatorMode) -> Self {
        self.emulator_mode = mode;
        self
    }

    pub fn with_display_colour(mut self, colour: DisplayColour) -> Self {
        self.display_colour = colour;
        self
    }

    pub fn build(self) -> EmulatorOptions {
        EmulatorOptions {
            boot_rom: self.boot_rom,
            saved_ram: self.saved_ram,
            emulator_mode: self.emulator_mode,
            display_colour: self.display_colour,
        }
    }
}
