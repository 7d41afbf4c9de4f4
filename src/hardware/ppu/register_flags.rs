//! Bitflag wrappers for LCDC (0xFF40), STAT (0xFF41), and the per-sprite OAM
//! attribute byte.

use bitflags::*;

bitflags! {
    #[derive(Default)]
    pub struct LcdControl: u8 {
        const BG_WINDOW_ENABLE = 0b0000_0001;
        const OBJ_ENABLE = 0b0000_0010;
        const OBJ_SIZE = 0b0000_0100;
        const BG_TILE_MAP = 0b0000_1000;
        const BG_WINDOW_TILE_DATA = 0b0001_0000;
        const WINDOW_ENABLE = 0b0010_0000;
        const WINDOW_TILE_MAP = 0b0100_0000;
        const LCD_ENABLE = 0b1000_0000;
    }
}

impl LcdControl {
    /// 8x16 sprites if set, 8x8 otherwise.
    pub fn tall_sprites(self) -> bool {
        self.contains(LcdControl::OBJ_SIZE)
    }

    pub fn bg_tile_map_base(self) -> u16 {
        if self.contains(LcdControl::BG_TILE_MAP) {
            0x9C00
        } else {
            0x9800
        }
    }

    pub fn window_tile_map_base(self) -> u16 {
        if self.contains(LcdControl::WINDOW_TILE_MAP) {
            0x9C00
        } else {
            0x9800
        }
    }

    /// Whether tile indices in the selected BG/window tile data area are signed
    /// (indexed relative to 0x9000) rather than unsigned (relative to 0x8000).
    pub fn bg_window_tile_data_signed(self) -> bool {
        !self.contains(LcdControl::BG_WINDOW_TILE_DATA)
    }
}

bitflags! {
    #[derive(Default)]
    pub struct LcdStatus: u8 {
        const MODE_LOW = 0b0000_0001;
        const MODE_HIGH = 0b0000_0010;
        const LYC_EQUALS_LY = 0b0000_0100;
        const HBLANK_INTERRUPT = 0b0000_1000;
        const VBLANK_INTERRUPT = 0b0001_0000;
        const OAM_INTERRUPT = 0b0010_0000;
        const LYC_INTERRUPT = 0b0100_0000;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    HBlank,
    VBlank,
    OamSearch,
    LcdTransfer,
}

impl Mode {
    pub fn bits(self) -> u8 {
        match self {
            Mode::HBlank => 0b00,
            Mode::VBlank => 0b01,
            Mode::OamSearch => 0b10,
            Mode::LcdTransfer => 0b11,
        }
    }

    pub fn interrupt_bit(self) -> Option<LcdStatus> {
        match self {
            Mode::HBlank => Some(LcdStatus::HBLANK_INTERRUPT),
            Mode::VBlank => Some(LcdStatus::VBLANK_INTERRUPT),
            Mode::OamSearch => Some(LcdStatus::OAM_INTERRUPT),
            Mode::LcdTransfer => None,
        }
    }
}

bitflags! {
    #[derive(Default)]
    pub struct AttributeFlags: u8 {
        const PALETTE_NUMBER_CGB_LOW = 0b0000_0001;
        const PALETTE_NUMBER_CGB_MID = 0b0000_0010;
        const PALETTE_NUMBER_CGB_HIGH = 0b0000_0100;
        const TILE_VRAM_BANK = 0b0000_1000;
        const PALETTE_NUMBER_DMG = 0b0001_0000;
        const X_FLIP = 0b0010_0000;
        const Y_FLIP = 0b0100_0000;
        const OBJ_TO_BG_PRIORITY = 0b1000_0000;
    }
}

impl AttributeFlags {
    pub fn uses_obp1(self) -> bool {
        self.contains(AttributeFlags::PALETTE_NUMBER_DMG)
    }
}
