//! Top level "system on chip" struct that owns every subsystem by value and drives
//! them all from a single synchronous stepping loop, CPU-paced: every memory access
//! the CPU makes advances the shared clock by exactly one M-cycle (4 T-cycles), and
//! that same access is the point at which the PPU, Timer, APU and any in-flight DMA
//! are ticked forward. There is no event scheduler or priority queue.

use crate::error::Error;
use crate::hardware::bus::Bus;
use crate::hardware::cpu::Cpu;
use crate::hardware::ppu::palette::{DisplayColour, DmgColor, FRAMEBUFFER_SIZE};
use crate::hardware::joypad::InputKey;
use crate::EmulatorOptions;

/// Frequency of the DMG/CGB (single speed) system clock, in Hz.
pub const CLOCK_SPEED: u64 = 4_194_304;
/// T-cycles in a single frame: 154 scanlines * 456 T-cycles/line.
pub const CYCLES_PER_FRAME: u32 = 70_224;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EmulatorMode {
    Dmg,
    Cgb,
}

impl Default for EmulatorMode {
    fn default() -> Self {
        EmulatorMode::Dmg
    }
}

impl EmulatorMode {
    pub fn is_cgb(self) -> bool {
        self == EmulatorMode::Cgb
    }

    pub fn is_dmg(self) -> bool {
        self == EmulatorMode::Dmg
    }
}

pub struct GameBoy {
    cpu: Cpu<Bus>,
}

impl GameBoy {
    pub fn new(rom: &[u8], options: EmulatorOptions) -> Result<Self, Error> {
        let bus = Bus::new(rom, options)?;
        let cpu = if bus.boot_rom_active() {
            Cpu::new(bus)
        } else {
            let is_cgb = bus.mode().is_cgb();
            Cpu::new_post_boot(bus, is_cgb)
        };
        Ok(GameBoy { cpu })
    }

    /// Decode and run exactly one CPU instruction (or one halted/stopped tick if the
    /// CPU is halted), ticking every other subsystem for every memory access made
    /// along the way.
    pub fn step(&mut self) {
        self.cpu.step_cycle();
    }

    /// Run instructions until the PPU has produced a completed frame.
    pub fn run_to_vblank(&mut self) {
        while !self.cpu.step_cycle_reporting_vblank() {}
    }

    pub fn frame_buffer(&self) -> &[DmgColor; FRAMEBUFFER_SIZE] {
        self.cpu.bus().ppu().frame_buffer()
    }

    pub fn press_key(&mut self, key: InputKey) {
        self.cpu.bus_mut().joypad_mut().press_key(key);
    }

    pub fn release_key(&mut self, key: InputKey) {
        self.cpu.bus_mut().joypad_mut().release_key(key);
    }

    /// Returns the cartridge's battery-backed RAM, if it has one, for host-side
    /// persistence. Writing that to disk is a host concern, not this crate's.
    pub fn battery_ram(&self) -> Option<&[u8]> {
        self.cpu.bus().cartridge().battery_ram()
    }

    pub fn bus(&self) -> &Bus {
        self.cpu.bus()
    }

    /// Total T-cycles ticked since construction, for checking an instruction's
    /// actual cost against the published cycle table.
    pub fn total_cycles(&self) -> u64 {
        self.cpu.bus().total_cycles()
    }

    pub fn cpu(&self) -> &Cpu<Bus> {
        &self.cpu
    }
}

pub fn display_colour_greyscale() -> DisplayColour {
    DisplayColour {
        white: (0xFF, 0xFF, 0xFF).into(),
        light_grey: (0xAA, 0xAA, 0xAA).into(),
        dark_grey: (0x55, 0x55, 0x55).into(),
        black: (0x00, 0x00, 0x00).into(),
    }
}
