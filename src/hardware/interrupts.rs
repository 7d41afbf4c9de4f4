//! Interrupt Enable (0xFFFF) and Interrupt Flag (0xFF0F) registers, and the fixed
//! priority order in which pending interrupts are dispatched.

use bitflags::*;

bitflags! {
    #[derive(Default)]
    pub struct InterruptFlags: u8 {
        const VBLANK = 0b0000_0001;
        const LCD_STAT = 0b0000_0010;
        const TIMER = 0b0000_0100;
        const SERIAL = 0b0000_1000;
        const JOYPAD = 0b0001_0000;
    }
}

/// The five interrupt sources in dispatch-priority order, highest first. On the real
/// hardware this order is a consequence of the interrupt vector layout (0x40, 0x48,
/// 0x50, 0x58, 0x60) being checked bit 0 to bit 4 in turn.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Interrupts {
    VBlank,
    LCDStat,
    Timer,
    Serial,
    Joypad,
}

impl Interrupts {
    pub fn iter() -> impl Iterator<Item = Interrupts> {
        [
            Interrupts::VBlank,
            Interrupts::LCDStat,
            Interrupts::Timer,
            Interrupts::Serial,
            Interrupts::Joypad,
        ]
        .iter()
        .copied()
    }

    pub fn flag(self) -> InterruptFlags {
        match self {
            Interrupts::VBlank => InterruptFlags::VBLANK,
            Interrupts::LCDStat => InterruptFlags::LCD_STAT,
            Interrupts::Timer => InterruptFlags::TIMER,
            Interrupts::Serial => InterruptFlags::SERIAL,
            Interrupts::Joypad => InterruptFlags::JOYPAD,
        }
    }

    /// Address of this interrupt's handler vector.
    pub fn address(self) -> u16 {
        match self {
            Interrupts::VBlank => 0x40,
            Interrupts::LCDStat => 0x48,
            Interrupts::Timer => 0x50,
            Interrupts::Serial => 0x58,
            Interrupts::Joypad => 0x60,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct InterruptFlagRegisters {
    pub interrupt_enable: InterruptFlags,
    pub interrupt_flag: InterruptFlags,
}

impl InterruptFlagRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// The interrupt that would be serviced next, if any, ignoring the IME flag.
    pub fn pending(&self) -> Option<Interrupts> {
        Interrupts::iter().find(|i| {
            self.interrupt_enable.contains(i.flag()) && self.interrupt_flag.contains(i.flag())
        })
    }

    pub fn request(&mut self, interrupt: Interrupts) {
        self.interrupt_flag.insert(interrupt.flag());
    }

    pub fn acknowledge(&mut self, interrupt: Interrupts) {
        self.interrupt_flag.remove(interrupt.flag());
    }

    pub fn read_if(&self) -> u8 {
        // Top 3 bits read back as 1 on real hardware.
        self.interrupt_flag.bits() | 0xE0
    }

    pub fn write_if(&mut self, value: u8) {
        self.interrupt_flag = InterruptFlags::from_bits_truncate(value);
    }

    pub fn read_ie(&self) -> u8 {
        self.interrupt_enable.bits()
    }

    pub fn write_ie(&mut self, value: u8) {
        self.interrupt_enable = InterruptFlags::from_bits_truncate(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_is_vblank_first() {
        let mut regs = InterruptFlagRegisters::new();
        regs.write_ie(0xFF);
        regs.request(Interrupts::Timer);
        regs.request(Interrupts::VBlank);

        assert_eq!(regs.pending(), Some(Interrupts::VBlank));
    }

    #[test]
    fn disabled_interrupt_is_not_pending() {
        let mut regs = InterruptFlagRegisters::new();
        regs.write_ie(0x00);
        regs.request(Interrupts::VBlank);

        assert_eq!(regs.pending(), None);
    }
}
