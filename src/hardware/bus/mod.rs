//! The system bus: routes every CPU memory access to the right subsystem, owns
//! WRAM/HRAM directly, and is the single place that ticks the PPU/Timer/APU for
//! every access the CPU makes. There's no scheduler sitting between the CPU and the
//! rest of the hardware — every `read_byte`/`write_byte` call advances the whole
//! machine by one M-cycle (4 T-cycles) before or after touching memory, exactly as a
//! real Game Boy's shared clock would.

mod dma;

use crate::error::Result;
use crate::gameboy::EmulatorMode;
use crate::hardware::apu::Apu;
use crate::hardware::bootrom::BootRom;
use crate::hardware::bus::dma::OamDma;
use crate::hardware::cartridge::Cartridge;
use crate::hardware::interrupts::InterruptFlagRegisters;
use crate::hardware::joypad::Joypad;
use crate::hardware::ppu::Ppu;
use crate::hardware::timer::Timers;
use crate::EmulatorOptions;
use log::warn;

pub struct Bus {
    cartridge: Cartridge,
    ppu: Ppu,
    apu: Apu,
    timers: Timers,
    joypad: Joypad,
    interrupts: InterruptFlagRegisters,
    bootrom: BootRom,
    oam_dma: OamDma,

    wram: [u8; 0x8000],
    wram_bank: usize,
    hram: [u8; 0x7F],

    serial_data: u8,
    serial_control: u8,

    mode: EmulatorMode,

    /// Running count of T-cycles this bus has ever ticked. Exists purely for
    /// diagnostics and tests that want to check an instruction's cost against the
    /// published cycle table; nothing in the emulation loop reads it back.
    total_cycles: u64,
}

impl Bus {
    pub fn new(rom: &[u8], options: EmulatorOptions) -> Result<Self> {
        let cartridge = Cartridge::new(rom, options.saved_ram)?;
        let mode = if cartridge.is_cgb() {
            EmulatorMode::Cgb
        } else {
            options.emulator_mode
        };

        Ok(Bus {
            cartridge,
            ppu: Ppu::new(options.display_colour),
            apu: Apu::new(),
            timers: Timers::new(),
            joypad: Joypad::new(),
            interrupts: InterruptFlagRegisters::new(),
            bootrom: BootRom::new(options.boot_rom),
            oam_dma: OamDma::new(),
            wram: [0; 0x8000],
            wram_bank: 1,
            hram: [0; 0x7F],
            serial_data: 0,
            serial_control: 0,
            mode,
            total_cycles: 0,
        })
    }

    /// Total T-cycles ticked since construction, for tests/tools that want to check
    /// an instruction's actual cost against the published cycle table.
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    pub fn apu(&self) -> &Apu {
        &self.apu
    }

    pub fn apu_mut(&mut self) -> &mut Apu {
        &mut self.apu
    }

    pub fn joypad_mut(&mut self) -> &mut Joypad {
        &mut self.joypad
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    pub fn interrupts(&self) -> &InterruptFlagRegisters {
        &self.interrupts
    }

    pub fn interrupts_mut(&mut self) -> &mut InterruptFlagRegisters {
        &mut self.interrupts
    }

    /// Whether the boot ROM is still mapped in at 0x0000-0x00FF. Used once, at
    /// construction, to decide whether the CPU should start from the hardware reset
    /// vector (boot ROM present) or the post-boot register state real hardware would
    /// have left behind (no boot ROM supplied).
    pub fn boot_rom_active(&self) -> bool {
        self.bootrom.is_active()
    }

    pub fn mode(&self) -> EmulatorMode {
        self.mode
    }

    fn wram_offset(&self, address: u16) -> usize {
        match address {
            0xC000..=0xCFFF => address as usize - 0xC000,
            0xD000..=0xDFFF => self.wram_bank * 0x1000 + (address as usize - 0xD000),
            _ => unreachable!(),
        }
    }

    /// Internal read used only by OAM DMA, which reads from wherever the CPU pointed
    /// it regardless of what the PPU would currently allow the CPU itself to see.
    fn dma_source_byte(&self, address: u16) -> u8 {
        match address {
            0x0000..=0x7FFF => self.cartridge.read_rom(address),
            0x8000..=0x9FFF => self.ppu.read_vram_unlocked(address),
            0xA000..=0xBFFF => self.cartridge.read_ram(address),
            0xC000..=0xDFFF => self.wram[self.wram_offset(address)],
            0xE000..=0xFDFF => self.wram[self.wram_offset(address - 0x2000)],
            _ => 0xFF,
        }
    }

    pub fn read_byte(&self, address: u16) -> u8 {
        match address {
            0x0000..=0x00FF if self.bootrom.is_active() => self.bootrom.read(address),
            0x0000..=0x7FFF => self.cartridge.read_rom(address),
            0x8000..=0x9FFF => self.ppu.read_vram(address),
            0xA000..=0xBFFF => self.cartridge.read_ram(address),
            0xC000..=0xDFFF => self.wram[self.wram_offset(address)],
            0xE000..=0xFDFF => self.wram[self.wram_offset(address - 0x2000)],
            0xFE00..=0xFE9F => {
                if self.oam_dma.blocks_cpu_oam() {
                    0xFF
                } else {
                    self.ppu.read_oam(address)
                }
            }
            0xFEA0..=0xFEFF => 0xFF,
            0xFF00 => self.joypad.read(),
            0xFF01 => self.serial_data,
            0xFF02 => self.serial_control | 0x7E,
            0xFF04 => self.timers.read_div(),
            0xFF05 => self.timers.read_tima(),
            0xFF06 => self.timers.read_tma(),
            0xFF07 => self.timers.read_tac(),
            0xFF0F => self.interrupts.read_if(),
            0xFF10..=0xFF26 | 0xFF30..=0xFF3F => self.apu.read_register(address),
            0xFF40..=0xFF4B | 0xFF4F => self.ppu.read_register(address),
            0xFF46 => self.oam_dma.read_source(),
            0xFF50 => 0xFF,
            0xFF70 if self.mode.is_cgb() => self.wram_bank as u8 | 0xF8,
            0xFF80..=0xFFFE => self.hram[(address - 0xFF80) as usize],
            0xFFFF => self.interrupts.read_ie(),
            _ => {
                warn!("read from unmapped address 0x{:04X}", address);
                0xFF
            }
        }
    }

    pub fn write_byte(&mut self, address: u16, value: u8) {
        match address {
            0x0000..=0x7FFF => self.cartridge.write_rom(address, value),
            0x8000..=0x9FFF => self.ppu.write_vram(address, value),
            0xA000..=0xBFFF => self.cartridge.write_ram(address, value),
            0xC000..=0xDFFF => {
                let offset = self.wram_offset(address);
                self.wram[offset] = value;
            }
            0xE000..=0xFDFF => {
                let offset = self.wram_offset(address - 0x2000);
                self.wram[offset] = value;
            }
            0xFE00..=0xFE9F => {
                if !self.oam_dma.blocks_cpu_oam() {
                    self.ppu.write_oam(address, value);
                }
            }
            0xFEA0..=0xFEFF => {}
            0xFF00 => self.joypad.write(value),
            0xFF01 => self.serial_data = value,
            0xFF02 => self.serial_control = value & 0x81,
            0xFF04 => self.timers.write_div(&mut self.interrupts),
            0xFF05 => self.timers.write_tima(value),
            0xFF06 => self.timers.write_tma(value),
            0xFF07 => self.timers.write_tac(value),
            0xFF0F => self.interrupts.write_if(value),
            0xFF10..=0xFF26 | 0xFF30..=0xFF3F => self.apu.write_register(address, value),
            0xFF40..=0xFF4B | 0xFF4F => self.ppu.write_register(address, value, &mut self.interrupts),
            0xFF46 => self.oam_dma.start(value),
            0xFF50 => self.bootrom.write_disable(value),
            0xFF70 if self.mode.is_cgb() => {
                let bank = value & 0x07;
                self.wram_bank = if bank == 0 { 1 } else { bank as usize };
            }
            0xFF80..=0xFFFE => self.hram[(address - 0xFF80) as usize] = value,
            0xFFFF => self.interrupts.write_ie(value),
            _ => warn!("write to unmapped address 0x{:04X} (value 0x{:02X})", address, value),
        }
    }

    /// Advance every ticked subsystem by exactly `cycles` T-cycles (always 4, once
    /// per CPU memory access). OAM DMA, if active, copies one more byte per M-cycle.
    pub fn tick(&mut self, cycles: u8) {
        self.total_cycles += cycles as u64;
        self.ppu.do_cycle(cycles, &mut self.interrupts);
        self.apu.tick(cycles);
        for _ in 0..cycles {
            self.timers.tick(&mut self.interrupts);
        }

        if let Some((source, offset)) = self.oam_dma.advance() {
            let byte = self.dma_source_byte(source);
            self.ppu.dma_write_oam(offset, byte);
        }
    }
}

impl crate::hardware::cpu::MemoryMapper for Bus {
    fn read_byte(&self, address: u16) -> u8 {
        Bus::read_byte(self, address)
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        Bus::write_byte(self, address, value);
    }

    fn tick(&mut self, cycles: u8) {
        Bus::tick(self, cycles);
    }

    fn interrupts(&self) -> &InterruptFlagRegisters {
        &self.interrupts
    }

    fn interrupts_mut(&mut self) -> &mut InterruptFlagRegisters {
        &mut self.interrupts
    }

    fn take_frame_ready(&mut self) -> bool {
        self.ppu.take_frame_ready()
    }
}
