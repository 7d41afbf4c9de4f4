//! End-to-end checks for cross-module invariants a single unit test can't see:
//! WRAM echoing, cartridge RAM gating, MBC1 bank-0 aliasing, DAA round-tripping,
//! and APU DAC/NR52 coupling. Exercised entirely through this crate's public API.

use dotmatrix_core::hardware::apu::Apu;
use dotmatrix_core::hardware::cartridge::Cartridge;
use dotmatrix_core::{EmulatorOptions, GameBoy, InputKey};
use pretty_assertions::{assert_eq, assert_ne};

fn rom_with_header(mapper: u8, rom_banks: usize, ram_size_code: u8) -> Vec<u8> {
    let mut rom = vec![0u8; rom_banks * 0x4000];
    rom[0x147] = mapper;
    rom[0x148] = match rom_banks {
        2 => 0x00,
        4 => 0x01,
        8 => 0x02,
        16 => 0x03,
        32 => 0x04,
        64 => 0x05,
        128 => 0x06,
        _ => 0x00,
    };
    rom[0x149] = ram_size_code;
    rom
}

fn new_gameboy(rom: &[u8]) -> GameBoy {
    GameBoy::new(rom, EmulatorOptions::default()).expect("valid rom header")
}

#[test]
fn p1_echo_ram_mirrors_working_ram() {
    let rom = rom_with_header(0x00, 2, 0x00);
    let gb = new_gameboy(&rom);
    let bus = gb.bus();

    for addr in 0xE000u32..=0xFDFFu32 {
        assert_eq!(
            bus.read_byte(addr as u16),
            bus.read_byte((addr - 0x2000) as u16),
            "echo mismatch at {:#06x}",
            addr
        );
    }
}

#[test]
fn p2_ram_enable_requires_low_nibble_0a() {
    let rom = rom_with_header(0x03, 4, 0x02); // MBC1+RAM+BATTERY, 8 KiB RAM
    let mut cart = Cartridge::new(&rom, None).unwrap();

    for v in 0u8..=0x1F {
        cart.write_rom(0x1000, v);
        cart.write_ram(0xA000, 0x42);
        let readback = cart.read_ram(0xA000);
        let should_be_enabled = v & 0x0F == 0x0A;
        if should_be_enabled {
            assert_eq!(readback, 0x42, "RAM should accept writes for enable byte {:#04x}", v);
        } else {
            assert_ne!(readback, 0x42, "RAM should reject writes for enable byte {:#04x}", v);
        }
        // Leave RAM enabled and clear the byte so the next iteration starts clean.
        cart.write_rom(0x1000, 0x0A);
        cart.write_ram(0xA000, 0x00);
    }
}

#[test]
fn p3_mbc1_bank_zero_aliases_to_bank_one() {
    let banks = 128usize; // large enough to exercise the 0x60 high-bank select
    let mut rom = rom_with_header(0x01, banks, 0x00); // plain MBC1
    for bank in 0..banks {
        rom[bank * 0x4000] = bank as u8;
    }
    let mut cart = Cartridge::new(&rom, None).unwrap();

    for high in [0x00u8, 0x01, 0x02, 0x03] {
        cart.write_rom(0x5000, high); // secondary 2-bit bank register
        cart.write_rom(0x2000, 0x00); // low 5 bits forced to 1 internally
        let forced = cart.read_rom(0x4000);
        cart.write_rom(0x2000, 0x01);
        let explicit = cart.read_rom(0x4000);
        assert_eq!(
            forced, explicit,
            "selecting low bank 0 should alias to low bank 1 for high={:#04x}",
            high
        );
    }
}

#[test]
fn p6_daa_round_trips_every_bcd_pair() {
    // LD A,d8 ; ADD A,d8 ; DAA ; HALT, at the cartridge entry point.
    for lhs in 0u8..100 {
        for rhs in 0u8..100 {
            let sum = lhs + rhs;
            if sum >= 100 {
                continue;
            }
            let lhs_bcd = ((lhs / 10) << 4) | (lhs % 10);
            let rhs_bcd = ((rhs / 10) << 4) | (rhs % 10);
            let expected_bcd = ((sum / 10) << 4) | (sum % 10);

            let mut rom = rom_with_header(0x00, 2, 0x00);
            rom[0x100] = 0x3E; // LD A,d8
            rom[0x101] = lhs_bcd;
            rom[0x102] = 0xC6; // ADD A,d8
            rom[0x103] = rhs_bcd;
            rom[0x104] = 0x27; // DAA
            rom[0x105] = 0x76; // HALT

            let mut gb = new_gameboy(&rom);
            gb.step(); // LD
            gb.step(); // ADD
            gb.step(); // DAA

            assert_eq!(
                gb.cpu().registers().a,
                expected_bcd,
                "DAA({:#04x} + {:#04x}) should read back as {:#04x}",
                lhs_bcd,
                rhs_bcd,
                expected_bcd
            );
        }
    }
}

#[test]
fn p7_dac_disable_clears_nr52_status_bit() {
    let mut apu = Apu::new();
    apu.write_register(0xFF26, 0x80); // power on
    apu.write_register(0xFF12, 0xF0); // channel 1 DAC on, full volume
    apu.write_register(0xFF14, 0x80); // trigger
    assert_eq!(apu.read_register(0xFF26) & 0x01, 0x01);

    apu.write_register(0xFF12, 0x00); // envelope period 0, not increasing -> DAC off
    assert_eq!(
        apu.read_register(0xFF26) & 0x01,
        0x00,
        "disabling channel 1's DAC should immediately clear its NR52 status bit"
    );
}

#[test]
fn p4_instruction_cycle_counts_match_the_published_table() {
    // (opcode bytes at 0x100, expected T-cycles for that single instruction)
    let cases: &[(&[u8], u64)] = &[
        (&[0x00], 4),             // NOP
        (&[0x3E, 0x01], 8),       // LD A,d8
        (&[0x06, 0x01], 8),       // LD B,d8
        (&[0x04], 4),             // INC B
        (&[0x34], 12),            // INC (HL)
        (&[0xC3, 0x00, 0x01], 16), // JP a16
        (&[0xCD, 0x00, 0x01], 24), // CALL a16
        (&[0x18, 0x00], 12),      // JR r8 (always taken)
    ];

    for (bytes, expected_cycles) in cases {
        let mut rom = rom_with_header(0x00, 2, 0x00);
        for (i, b) in bytes.iter().enumerate() {
            rom[0x100 + i] = *b;
        }
        let mut gb = new_gameboy(&rom);
        let before = gb.total_cycles();
        gb.step();
        let after = gb.total_cycles();
        assert_eq!(
            after - before,
            *expected_cycles,
            "opcode bytes {:?} should cost {} T-cycles",
            bytes,
            expected_cycles
        );
    }
}

#[test]
fn p4_call_then_ret_round_trips_cycle_cost() {
    let mut rom = rom_with_header(0x00, 2, 0x00);
    rom[0x100] = 0xCD; // CALL 0x104
    rom[0x101] = 0x04;
    rom[0x102] = 0x01;
    rom[0x104] = 0xC9; // RET

    let mut gb = new_gameboy(&rom);
    let before = gb.total_cycles();
    gb.step(); // CALL
    let after_call = gb.total_cycles();
    gb.step(); // RET
    let after_ret = gb.total_cycles();

    assert_eq!(after_call - before, 24, "CALL a16 should cost 24 T-cycles");
    assert_eq!(after_ret - after_call, 16, "RET should cost 16 T-cycles");
}

#[test]
fn p3_oam_dma_blocks_cpu_reads_of_oam_until_the_transfer_finishes() {
    // LD A,0x11 ; LD (0xFE00),A ; LD A,0x22 ; LD (0xC000),A ; LD A,0xC0 ; LDH (0xFF46),A
    // then a run of NOPs, one per M-cycle, to ride out the 160-byte transfer.
    let mut rom = rom_with_header(0x00, 2, 0x00);
    let program: &[u8] = &[
        0x3E, 0x11, 0xEA, 0x00, 0xFE, 0x3E, 0x22, 0xEA, 0x00, 0xC0, 0x3E, 0xC0, 0xE0, 0x46,
    ];
    for (i, b) in program.iter().enumerate() {
        rom[0x100 + i] = *b;
    }
    for i in 0..200 {
        rom[0x100 + program.len() + i] = 0x00; // NOP
    }

    let mut gb = new_gameboy(&rom);
    for _ in 0..6 {
        gb.step(); // the 3 LD/LDH pairs, ending with the 0xFF46 write that starts DMA
    }

    // Each NOP after the 0xFF46 write costs exactly one M-cycle, matching the DMA
    // unit's one-byte-per-M-cycle pace, so stepping once per NOP lines up with the
    // spec's cycle-numbered scenario.
    for cycle in 1..=160 {
        gb.step();
        assert_eq!(
            gb.bus().read_byte(0xFE00),
            0xFF,
            "OAM should read back 0xFF at cycle {} of an in-flight DMA",
            cycle
        );
    }
    gb.step(); // cycle 161: the CPU can see OAM again

    assert_eq!(
        gb.bus().read_byte(0xFE00),
        0x22,
        "OAM[0x00] should read back the copied WRAM byte once the transfer is done"
    );
}

#[test]
fn joypad_reflects_pressed_keys_through_the_full_stack() {
    let rom = rom_with_header(0x00, 2, 0x00);
    let mut gb = new_gameboy(&rom);
    gb.press_key(InputKey::A);
    gb.release_key(InputKey::A);
}
