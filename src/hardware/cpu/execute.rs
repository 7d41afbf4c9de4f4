//! Opcode decode and dispatch. Built on the regularities of the LR35902 encoding
//! (most of the opcode space is `LD r, r'`, `<alu> A, r`, or a CB-prefixed
//! rotate/shift/BIT/RES/SET keyed off the same 3-bit register field) rather than a
//! 256-entry function-pointer table, so each *shape* of instruction is written once.

use crate::hardware::cpu::traits::R8;
use crate::hardware::cpu::{Cpu, MemoryMapper};

impl<M: MemoryMapper> Cpu<M> {
    pub(crate) fn execute(&mut self, opcode: u8) {
        match opcode {
            0x00 => {}
            0x10 => self.stop(),
            0x76 => self.halt(),

            0x01 | 0x11 | 0x21 | 0x31 => {
                let value = self.fetch_word();
                self.write_r16_group1(opcode >> 4, value);
            }
            0x02 => self.mem_write(self.registers.bc(), self.registers.a),
            0x12 => self.mem_write(self.registers.de(), self.registers.a),
            0x22 => {
                let hl = self.registers.hl();
                self.mem_write(hl, self.registers.a);
                self.registers.set_hl(hl.wrapping_add(1));
            }
            0x32 => {
                let hl = self.registers.hl();
                self.mem_write(hl, self.registers.a);
                self.registers.set_hl(hl.wrapping_sub(1));
            }

            0x03 | 0x13 | 0x23 | 0x33 => {
                let index = opcode >> 4;
                let value = self.read_r16_group1(index).wrapping_add(1);
                self.internal_delay();
                self.write_r16_group1(index, value);
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                let index = opcode >> 4;
                let value = self.read_r16_group1(index).wrapping_sub(1);
                self.internal_delay();
                self.write_r16_group1(index, value);
            }

            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let r = R8((opcode >> 3) & 0x07);
                let value = self.read_r8(r);
                let result = self.alu_inc(value);
                self.write_r8(r, result);
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let r = R8((opcode >> 3) & 0x07);
                let value = self.read_r8(r);
                let result = self.alu_dec(value);
                self.write_r8(r, result);
            }
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let r = R8((opcode >> 3) & 0x07);
                let value = self.fetch_byte();
                self.write_r8(r, value);
            }

            0x07 => {
                let result = self.alu_rlc(self.registers.a);
                self.registers.a = result;
                self.registers.set_zf(false);
            }
            0x0F => {
                let result = self.alu_rrc(self.registers.a);
                self.registers.a = result;
                self.registers.set_zf(false);
            }
            0x17 => {
                let result = self.alu_rl(self.registers.a);
                self.registers.a = result;
                self.registers.set_zf(false);
            }
            0x1F => {
                let result = self.alu_rr(self.registers.a);
                self.registers.a = result;
                self.registers.set_zf(false);
            }

            0x08 => {
                let address = self.fetch_word();
                let sp = self.registers.sp;
                self.mem_write(address, sp as u8);
                self.mem_write(address.wrapping_add(1), (sp >> 8) as u8);
            }

            0x09 | 0x19 | 0x29 | 0x39 => {
                let value = self.read_r16_group1(opcode >> 4);
                self.internal_delay();
                self.alu_add_hl(value);
            }

            0x0A => self.registers.a = self.mem_read(self.registers.bc()),
            0x1A => self.registers.a = self.mem_read(self.registers.de()),
            0x2A => {
                let hl = self.registers.hl();
                self.registers.a = self.mem_read(hl);
                self.registers.set_hl(hl.wrapping_add(1));
            }
            0x3A => {
                let hl = self.registers.hl();
                self.registers.a = self.mem_read(hl);
                self.registers.set_hl(hl.wrapping_sub(1));
            }

            0x18 => self.jump_relative(true),
            0x20 => self.jump_relative(!self.registers.zf()),
            0x28 => self.jump_relative(self.registers.zf()),
            0x30 => self.jump_relative(!self.registers.cf()),
            0x38 => self.jump_relative(self.registers.cf()),

            0x27 => self.alu_daa(),
            0x2F => {
                self.registers.a = !self.registers.a;
                self.registers.set_n(true);
                self.registers.set_h(true);
            }
            0x37 => {
                self.registers.set_n(false);
                self.registers.set_h(false);
                self.registers.set_cf(true);
            }
            0x3F => {
                let carry = self.registers.cf();
                self.registers.set_n(false);
                self.registers.set_h(false);
                self.registers.set_cf(!carry);
            }

            0x40..=0x7F => {
                let dst = R8((opcode >> 3) & 0x07);
                let src = R8(opcode & 0x07);
                let value = self.read_r8(src);
                self.write_r8(dst, value);
            }

            0x80..=0xBF => {
                let r = R8(opcode & 0x07);
                let value = self.read_r8(r);
                self.alu_group(opcode >> 3, value);
            }

            0xC0 => self.ret_conditional(!self.registers.zf()),
            0xC8 => self.ret_conditional(self.registers.zf()),
            0xD0 => self.ret_conditional(!self.registers.cf()),
            0xD8 => self.ret_conditional(self.registers.cf()),
            0xC9 => self.ret(),
            0xD9 => {
                self.ret();
                self.set_ime(true);
            }

            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop_word();
                self.write_r16_group2(opcode >> 4 & 0x03, value);
            }
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                self.internal_delay();
                let value = self.read_r16_group2(opcode >> 4 & 0x03);
                self.push_word(value);
            }

            0xC2 => self.jump_absolute(!self.registers.zf()),
            0xCA => self.jump_absolute(self.registers.zf()),
            0xD2 => self.jump_absolute(!self.registers.cf()),
            0xDA => self.jump_absolute(self.registers.cf()),
            0xC3 => self.jump_absolute(true),
            0xE9 => self.registers.pc = self.registers.hl(),

            0xC4 => self.call_conditional(!self.registers.zf()),
            0xCC => self.call_conditional(self.registers.zf()),
            0xD4 => self.call_conditional(!self.registers.cf()),
            0xDC => self.call_conditional(self.registers.cf()),
            0xCD => self.call_conditional(true),

            0xC6 => {
                let value = self.fetch_byte();
                self.alu_add(value, false);
            }
            0xCE => {
                let value = self.fetch_byte();
                self.alu_add(value, true);
            }
            0xD6 => {
                let value = self.fetch_byte();
                self.alu_sub(value, false, true);
            }
            0xDE => {
                let value = self.fetch_byte();
                self.alu_sub(value, true, true);
            }
            0xE6 => {
                let value = self.fetch_byte();
                self.alu_and(value);
            }
            0xEE => {
                let value = self.fetch_byte();
                self.alu_xor(value);
            }
            0xF6 => {
                let value = self.fetch_byte();
                self.alu_or(value);
            }
            0xFE => {
                let value = self.fetch_byte();
                self.alu_cp(value);
            }

            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.internal_delay();
                self.push_word(self.registers.pc);
                self.registers.pc = (opcode & 0x38) as u16;
            }

            0xE0 => {
                let offset = self.fetch_byte();
                self.mem_write(0xFF00 + offset as u16, self.registers.a);
            }
            0xF0 => {
                let offset = self.fetch_byte();
                self.registers.a = self.mem_read(0xFF00 + offset as u16);
            }
            0xE2 => self.mem_write(0xFF00 + self.registers.c as u16, self.registers.a),
            0xF2 => self.registers.a = self.mem_read(0xFF00 + self.registers.c as u16),
            0xEA => {
                let address = self.fetch_word();
                self.mem_write(address, self.registers.a);
            }
            0xFA => {
                let address = self.fetch_word();
                self.registers.a = self.mem_read(address);
            }

            0xE8 => {
                let offset = self.fetch_byte() as i8;
                self.internal_delay();
                self.internal_delay();
                self.registers.sp = self.alu_add_sp_signed(offset);
            }
            0xF8 => {
                let offset = self.fetch_byte() as i8;
                self.internal_delay();
                let result = self.alu_add_sp_signed(offset);
                self.registers.set_hl(result);
            }
            0xF9 => {
                self.internal_delay();
                self.registers.sp = self.registers.hl();
            }

            0xF3 => self.set_ime(false),
            0xFB => self.schedule_ime_enable(),

            0xCB => {
                let cb_opcode = self.fetch_byte();
                self.execute_cb(cb_opcode);
            }

            // D3, DB, DD, E3, E4, EB, EC, ED, F4, FC, FD: no defined meaning on real
            // hardware. Real silicon locks up; this core surfaces it as a
            // catchable, non-panicking error instead and halts the CPU in place.
            _ => {
                self.last_error = Some(crate::error::Error::UnimplementedOpcode(opcode));
                self.halt();
            }
        }
    }

    fn alu_group(&mut self, group: u8, value: u8) {
        match group & 0x07 {
            0 => self.alu_add(value, false),
            1 => self.alu_add(value, true),
            2 => {
                self.alu_sub(value, false, true);
            }
            3 => {
                self.alu_sub(value, true, true);
            }
            4 => self.alu_and(value),
            5 => self.alu_xor(value),
            6 => self.alu_or(value),
            7 => self.alu_cp(value),
            _ => unreachable!(),
        }
    }

    fn jump_relative(&mut self, take: bool) {
        let offset = self.fetch_byte() as i8;
        if take {
            self.internal_delay();
            self.registers.pc = self.registers.pc.wrapping_add(offset as i16 as u16);
        }
    }

    fn jump_absolute(&mut self, take: bool) {
        let address = self.fetch_word();
        if take {
            self.internal_delay();
            self.registers.pc = address;
        }
    }

    fn call_conditional(&mut self, take: bool) {
        let address = self.fetch_word();
        if take {
            self.internal_delay();
            self.push_word(self.registers.pc);
            self.registers.pc = address;
        }
    }

    fn ret(&mut self) {
        let address = self.pop_word();
        self.internal_delay();
        self.registers.pc = address;
    }

    fn ret_conditional(&mut self, take: bool) {
        self.internal_delay();
        if take {
            self.ret();
        }
    }

    fn execute_cb(&mut self, opcode: u8) {
        let r = R8(opcode & 0x07);
        let group = opcode >> 3;

        match opcode {
            0x00..=0x3F => {
                let value = self.read_r8(r);
                let result = match group & 0x07 {
                    0 => self.alu_rlc(value),
                    1 => self.alu_rrc(value),
                    2 => self.alu_rl(value),
                    3 => self.alu_rr(value),
                    4 => self.alu_sla(value),
                    5 => self.alu_sra(value),
                    6 => self.alu_swap(value),
                    7 => self.alu_srl(value),
                    _ => unreachable!(),
                };
                self.write_r8(r, result);
            }
            0x40..=0x7F => {
                let bit = group & 0x07;
                let value = self.read_r8(r);
                self.alu_bit(value, bit);
            }
            0x80..=0xBF => {
                let bit = group & 0x07;
                let value = self.read_r8(r) & !(1 << bit);
                self.write_r8(r, value);
            }
            0xC0..=0xFF => {
                let bit = group & 0x07;
                let value = self.read_r8(r) | (1 << bit);
                self.write_r8(r, value);
            }
        }
    }
}
