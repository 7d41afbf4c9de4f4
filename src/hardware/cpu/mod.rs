//! The LR35902 core: fetch/decode/execute plus interrupt dispatch, HALT/STOP, and
//! the IME-enable delay that makes `EI` take effect only after the instruction that
//! follows it. Every memory access made while executing an instruction advances the
//! rest of the machine by one M-cycle through the bus it's generic over, so cycle
//! accuracy falls out of the decode loop rather than being bolted on afterward.

mod alu;
pub mod execute;
pub mod traits;

use crate::error::Error;
use crate::hardware::interrupts::InterruptFlagRegisters;
use crate::hardware::registers::Registers;

/// What a CPU needs from the rest of the machine: byte-addressed memory, a way to
/// advance every other ticked subsystem in lockstep, and access to the interrupt
/// registers that live on the bus rather than inside the CPU itself.
pub trait MemoryMapper {
    fn read_byte(&self, address: u16) -> u8;
    fn write_byte(&mut self, address: u16, value: u8);
    /// Advance every ticked subsystem (PPU, APU, timers, DMA) by `cycles` T-cycles.
    fn tick(&mut self, cycles: u8);
    fn interrupts(&self) -> &InterruptFlagRegisters;
    fn interrupts_mut(&mut self) -> &mut InterruptFlagRegisters;
    /// Whether the PPU just finished a frame; consumed by the host's frame loop.
    fn take_frame_ready(&mut self) -> bool;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum RunState {
    Running,
    Halted,
    Stopped,
}

pub struct Cpu<M: MemoryMapper> {
    pub(crate) registers: Registers,
    bus: M,

    ime: bool,
    /// Set by `EI`. Flips `ime` true at the top of the *next* `step_cycle`, but that
    /// same step is still barred from dispatching an interrupt — it owes the machine
    /// the one instruction `EI` promised would run first. Only the step after that
    /// one actually checks for a pending interrupt with IME live.
    ime_scheduled: bool,
    state: RunState,
    /// Set when `HALT` executes with IME off and an interrupt already pending: the
    /// very next opcode fetch re-reads the same byte instead of advancing PC.
    halt_bug: bool,

    last_error: Option<Error>,
}

impl<M: MemoryMapper> Cpu<M> {
    pub fn new(bus: M) -> Self {
        Cpu {
            registers: Registers::new(),
            bus,
            ime: false,
            ime_scheduled: false,
            state: RunState::Running,
            halt_bug: false,
            last_error: None,
        }
    }

    /// Construct a CPU already in the register state real hardware is left in once
    /// the boot ROM hands off to the cartridge, for the common case of running
    /// without a boot ROM image supplied.
    pub fn new_post_boot(bus: M, is_cgb: bool) -> Self {
        Cpu {
            registers: Registers::post_boot(is_cgb),
            ..Cpu::new(bus)
        }
    }

    pub fn bus(&self) -> &M {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut M {
        &mut self.bus
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    pub fn is_halted(&self) -> bool {
        self.state == RunState::Halted
    }

    #[inline]
    pub(crate) fn mem_read(&mut self, address: u16) -> u8 {
        self.bus.tick(4);
        self.bus.read_byte(address)
    }

    #[inline]
    pub(crate) fn mem_write(&mut self, address: u16, value: u8) {
        self.bus.tick(4);
        self.bus.write_byte(address, value);
    }

    /// A cycle spent on internal CPU work (register shuffling, branch-taken
    /// penalty) rather than a memory access, but which still costs an M-cycle on
    /// real hardware and must still advance everything else.
    #[inline]
    pub(crate) fn internal_delay(&mut self) {
        self.bus.tick(4);
    }

    fn fetch_opcode(&mut self) -> u8 {
        let byte = self.mem_read(self.registers.pc);
        if self.halt_bug {
            self.halt_bug = false;
        } else {
            self.registers.pc = self.registers.pc.wrapping_add(1);
        }
        byte
    }

    pub(crate) fn fetch_byte(&mut self) -> u8 {
        let byte = self.mem_read(self.registers.pc);
        self.registers.pc = self.registers.pc.wrapping_add(1);
        byte
    }

    pub(crate) fn fetch_word(&mut self) -> u16 {
        let low = self.fetch_byte();
        let high = self.fetch_byte();
        (high as u16) << 8 | low as u16
    }

    pub(crate) fn push_word(&mut self, value: u16) {
        self.registers.sp = self.registers.sp.wrapping_sub(1);
        self.mem_write(self.registers.sp, (value >> 8) as u8);
        self.registers.sp = self.registers.sp.wrapping_sub(1);
        self.mem_write(self.registers.sp, value as u8);
    }

    pub(crate) fn pop_word(&mut self) -> u16 {
        let low = self.mem_read(self.registers.sp);
        self.registers.sp = self.registers.sp.wrapping_add(1);
        let high = self.mem_read(self.registers.sp);
        self.registers.sp = self.registers.sp.wrapping_add(1);
        (high as u16) << 8 | low as u16
    }

    pub(crate) fn set_ime(&mut self, value: bool) {
        self.ime = value;
        self.ime_scheduled = false;
    }

    pub(crate) fn schedule_ime_enable(&mut self) {
        self.ime_scheduled = true;
    }

    pub(crate) fn halt(&mut self) {
        if self.ime {
            self.state = RunState::Halted;
        } else if self.bus.interrupts().pending().is_some() {
            self.halt_bug = true;
        } else {
            self.state = RunState::Halted;
        }
    }

    pub(crate) fn stop(&mut self) {
        // STOP is followed by a padding byte in every real ROM; consume it the same
        // way hardware's instruction decoder does.
        let _ = self.fetch_byte();
        self.state = RunState::Stopped;
    }

    /// A push of PC's high byte that lands on 0xFFFF clobbers IE mid-dispatch: real
    /// hardware ends up reading back a vector of 0x00 instead of the one it latched,
    /// and since the interrupt was never actually delivered, its IF bit goes back up.
    fn dispatch_to(&mut self, interrupt: crate::hardware::interrupts::Interrupts) {
        self.registers.sp = self.registers.sp.wrapping_sub(1);
        let high_address = self.registers.sp;
        self.mem_write(high_address, (self.registers.pc >> 8) as u8);
        self.registers.sp = self.registers.sp.wrapping_sub(1);
        self.mem_write(self.registers.sp, self.registers.pc as u8);

        if high_address == 0xFFFF {
            self.bus.interrupts_mut().request(interrupt);
            self.registers.pc = 0x0000;
        } else {
            self.registers.pc = interrupt.address();
        }
    }

    fn try_dispatch_interrupt(&mut self) -> bool {
        if !self.ime {
            return false;
        }
        let interrupt = match self.bus.interrupts().pending() {
            Some(interrupt) => interrupt,
            None => return false,
        };

        self.ime = false;
        self.internal_delay();
        self.internal_delay();
        self.bus.interrupts_mut().acknowledge(interrupt);
        self.dispatch_to(interrupt);
        true
    }

    /// Run exactly one instruction's worth of work: a halted/stopped CPU just idles
    /// for one M-cycle and checks whether it should wake up.
    pub fn step_cycle(&mut self) {
        // `EI` schedules IME to go live right here, but the step that turns it on is
        // exactly the step that runs the instruction `EI` promised would execute
        // first — so that same step must not act on the now-live IME yet.
        let ime_just_enabled = self.ime_scheduled;
        if self.ime_scheduled {
            self.ime = true;
            self.ime_scheduled = false;
        }

        match self.state {
            RunState::Halted => {
                self.internal_delay();
                if self.bus.interrupts().pending().is_some() {
                    self.state = RunState::Running;
                }
                return;
            }
            RunState::Stopped => {
                self.internal_delay();
                if self
                    .bus
                    .interrupts()
                    .pending()
                    .map_or(false, |i| i == crate::hardware::interrupts::Interrupts::Joypad)
                {
                    self.state = RunState::Running;
                }
                return;
            }
            RunState::Running => {}
        }

        if !ime_just_enabled && self.try_dispatch_interrupt() {
            return;
        }

        #[cfg(feature = "cpu-logging")]
        log::trace!("{}", self.registers);

        let opcode = self.fetch_opcode();
        self.execute(opcode);
    }

    /// Identical to [`Cpu::step_cycle`] but also reports whether the PPU just
    /// finished rendering a frame, for a host's run-to-vblank loop.
    pub fn step_cycle_reporting_vblank(&mut self) -> bool {
        self.step_cycle();
        self.bus.take_frame_ready()
    }
}

#[cfg(test)]
mod tests {
    use crate::hardware::bus::Bus;
    use crate::hardware::cpu::Cpu;
    use crate::hardware::interrupts::Interrupts;
    use crate::EmulatorOptions;

    /// A CPU in the post-boot register state (PC=0x100, SP=0xFFFE), with `program`
    /// placed starting at the cartridge entry point so `step_cycle` executes it.
    fn cpu_with_program(program: &[u8]) -> Cpu<Bus> {
        let mut rom = vec![0u8; 0x8000];
        rom[0x147] = 0x00;
        rom[0x148] = 0x01;
        for (i, b) in program.iter().enumerate() {
            rom[0x100 + i] = *b;
        }
        let bus = Bus::new(&rom, EmulatorOptions::default()).unwrap();
        Cpu::new_post_boot(bus, false)
    }

    #[test]
    fn halt_bug_runs_the_following_opcode_twice() {
        let mut cpu = cpu_with_program(&[0x76, 0x3C]); // HALT ; INC A
        cpu.registers.a = 0;
        cpu.bus_mut().interrupts_mut().write_ie(0x01);
        cpu.bus_mut().interrupts_mut().request(Interrupts::VBlank);

        cpu.step_cycle(); // HALT executes with IME off and an interrupt pending:
        assert!(!cpu.is_halted(), "the halt bug keeps the CPU running instead of halting it");

        cpu.step_cycle(); // re-reads INC A without advancing PC
        assert_eq!(cpu.registers.a, 1);

        cpu.step_cycle(); // re-executes the same INC A, this time advancing PC
        assert_eq!(cpu.registers.a, 2);
    }

    #[test]
    fn ei_enables_interrupts_only_after_the_following_instruction() {
        let mut cpu = cpu_with_program(&[0xFB, 0x00, 0x00]); // EI ; NOP ; NOP
        cpu.bus_mut().interrupts_mut().write_ie(0x01);
        cpu.bus_mut().interrupts_mut().request(Interrupts::VBlank);

        cpu.step_cycle(); // EI
        cpu.step_cycle(); // the one guaranteed instruction after EI must still run
        assert_eq!(cpu.registers.pc, 0x102, "EI's own NOP must execute uninterrupted");

        cpu.step_cycle(); // only now may the pending interrupt actually dispatch
        assert_eq!(cpu.registers.pc, Interrupts::VBlank.address());
    }

    #[test]
    fn ei_immediately_followed_by_di_never_services_the_pending_interrupt() {
        let mut cpu = cpu_with_program(&[0xFB, 0xF3, 0x00]); // EI ; DI ; NOP
        cpu.bus_mut().interrupts_mut().write_ie(0x01);
        cpu.bus_mut().interrupts_mut().request(Interrupts::VBlank);

        cpu.step_cycle(); // EI
        cpu.step_cycle(); // DI runs as EI's guaranteed next instruction
        cpu.step_cycle(); // NOP

        assert_eq!(cpu.registers.pc, 0x103, "nothing should have redirected to a vector");
        assert!(cpu.bus().interrupts().pending().is_some(), "the interrupt is still pending, just never serviced");
    }

    #[test]
    fn interrupt_dispatch_pushing_pc_high_byte_onto_ie_redirects_to_vector_zero() {
        let mut cpu = cpu_with_program(&[]);
        cpu.registers.pc = 0x1234;
        cpu.registers.sp = 0x0000; // the high-byte push lands exactly on 0xFFFF
        cpu.set_ime(true);
        cpu.bus_mut().interrupts_mut().write_ie(0x01);
        cpu.bus_mut().interrupts_mut().request(Interrupts::VBlank);

        cpu.step_cycle();

        assert_eq!(cpu.registers.pc, 0x0000, "the clobbered IE redirects dispatch to vector 0x00");
        assert_ne!(
            cpu.bus().interrupts().read_if() & Interrupts::VBlank.flag().bits(),
            0,
            "the interrupt was never really delivered, so its IF bit must go back up"
        );
    }
}
