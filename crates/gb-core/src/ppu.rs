//! PPU (Picture Processing Unit) timing state machine
//!
//! Each scanline walks OAM search (80 clocks), pixel transfer (172) and HBlank (204),
//! 456 clocks in total. After the 144 visible lines come 10 VBlank lines of 456 clocks
//! each, then the frame starts over at line 0. Clock units left over after a mode
//! change carry into the next mode.
//!
//! The background layer is rendered one line at a time when pixel transfer ends.

use std::fmt;

use crate::mmu::{io, Mmu};

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

pub const OAM_SEARCH_CYCLES: u32 = 80;
pub const PIXEL_TRANSFER_CYCLES: u32 = 172;
pub const HBLANK_CYCLES: u32 = 204;
pub const SCANLINE_CYCLES: u32 = OAM_SEARCH_CYCLES + PIXEL_TRANSFER_CYCLES + HBLANK_CYCLES;

/// Lines 144-153 are VBlank
pub const VBLANK_LINES: u8 = 10;
pub const TOTAL_LINES: u8 = SCREEN_HEIGHT as u8 + VBLANK_LINES;

/// Clock units per frame
pub const FRAME_CYCLES: u32 = SCANLINE_CYCLES * TOTAL_LINES as u32;

/// PPU mode, numbered as reported in STAT bits 0-1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamSearch = 2,
    PixelTransfer = 3,
}

impl Mode {
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Clock units spent in this mode (per line for VBlank)
    pub fn duration(self) -> u32 {
        match self {
            Mode::OamSearch => OAM_SEARCH_CYCLES,
            Mode::PixelTransfer => PIXEL_TRANSFER_CYCLES,
            Mode::HBlank => HBLANK_CYCLES,
            Mode::VBlank => SCANLINE_CYCLES,
        }
    }

    /// STAT bit enabling an interrupt on entering this mode
    fn stat_source(self) -> Option<u8> {
        match self {
            Mode::HBlank => Some(LcdStatus::HBLANK_INTERRUPT),
            Mode::VBlank => Some(LcdStatus::VBLANK_INTERRUPT),
            Mode::OamSearch => Some(LcdStatus::OAM_INTERRUPT),
            Mode::PixelTransfer => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::HBlank => "HBlank",
            Mode::VBlank => "VBlank",
            Mode::OamSearch => "OAM search",
            Mode::PixelTransfer => "pixel transfer",
        };
        write!(f, "{}", name)
    }
}

/// LCDC ($FF40)
#[derive(Debug, Clone, Copy)]
pub struct LcdControl(u8);

impl LcdControl {
    pub const DISPLAY_ENABLE: u8 = 0b1000_0000;
    pub const TILE_DATA: u8 = 0b0001_0000;
    pub const BG_TILE_MAP: u8 = 0b0000_1000;
    pub const BG_ENABLE: u8 = 0b0000_0001;

    pub fn new(val: u8) -> Self {
        Self(val)
    }

    pub fn display_enabled(&self) -> bool {
        (self.0 & Self::DISPLAY_ENABLE) != 0
    }

    pub fn background_enabled(&self) -> bool {
        (self.0 & Self::BG_ENABLE) != 0
    }

    /// VRAM offset of the background tile map
    pub fn tile_map_base(&self) -> usize {
        if (self.0 & Self::BG_TILE_MAP) != 0 {
            0x1C00
        } else {
            0x1800
        }
    }

    /// VRAM offset of a tile's data. In $8800 mode the index is signed around $9000.
    pub fn tile_data_offset(&self, index: u8) -> usize {
        if (self.0 & Self::TILE_DATA) != 0 {
            index as usize * 16
        } else {
            (0x1000 + (index as i8 as i32) * 16) as usize
        }
    }
}

/// STAT ($FF41) interrupt source bits
#[derive(Debug, Clone, Copy)]
pub struct LcdStatus(u8);

impl LcdStatus {
    pub const HBLANK_INTERRUPT: u8 = 0b0000_1000;
    pub const VBLANK_INTERRUPT: u8 = 0b0001_0000;
    pub const OAM_INTERRUPT: u8 = 0b0010_0000;
    pub const COINCIDENCE_INTERRUPT: u8 = 0b0100_0000;

    pub fn new(val: u8) -> Self {
        Self(val)
    }

    pub fn enabled(&self, source: u8) -> bool {
        (self.0 & source) != 0
    }
}

/// One of the four DMG grey levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shade {
    #[default]
    White,
    LightGray,
    DarkGray,
    Black,
}

impl Shade {
    /// Map a 2-bit colour number through a palette register
    pub fn from_palette(palette: u8, color: u8) -> Self {
        match (palette >> (color * 2)) & 0x03 {
            0 => Shade::White,
            1 => Shade::LightGray,
            2 => Shade::DarkGray,
            _ => Shade::Black,
        }
    }

    /// 8-bit grey level
    pub fn luminance(self) -> u8 {
        match self {
            Shade::White => 0xFF,
            Shade::LightGray => 0xAA,
            Shade::DarkGray => 0x55,
            Shade::Black => 0x00,
        }
    }
}

/// What happened during a call to [`Ppu::tick`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PpuEvents {
    /// Line 144 was reached and VBlank began
    pub entered_vblank: bool,
    /// The last VBlank line ended and line 0 began
    pub frame_complete: bool,
    /// A mode or LY=LYC transition matched an enabled STAT source
    pub stat_interrupt: bool,
}

/// PPU state
#[derive(Debug, Clone)]
pub struct Ppu {
    mode: Mode,
    /// Clock units spent in the current mode
    clock: u32,
    /// Current scanline (LY), 0-153
    line: u8,
    frame_buffer: Vec<Shade>,
    frames: u64,
}

impl Ppu {
    /// Power-on state: line 0, OAM search
    pub fn new() -> Self {
        Self {
            mode: Mode::OamSearch,
            clock: 0,
            line: 0,
            frame_buffer: vec![Shade::White; SCREEN_WIDTH * SCREEN_HEIGHT],
            frames: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn scanline(&self) -> u8 {
        self.line
    }

    /// Clock units accumulated in the current mode
    pub fn clock(&self) -> u32 {
        self.clock
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn in_vblank(&self) -> bool {
        self.mode == Mode::VBlank
    }

    /// 160x144 shades, row-major
    pub fn frame_buffer(&self) -> &[Shade] {
        &self.frame_buffer
    }

    /// Advance by elapsed clock units, crossing as many mode boundaries as needed
    pub fn tick(&mut self, cycles: u32, mmu: &Mmu) -> PpuEvents {
        let mut events = PpuEvents::default();
        self.clock += cycles;

        while self.clock >= self.mode.duration() {
            self.clock -= self.mode.duration();
            self.advance(mmu, &mut events);
        }

        events
    }

    fn advance(&mut self, mmu: &Mmu, events: &mut PpuEvents) {
        match self.mode {
            Mode::OamSearch => self.enter(Mode::PixelTransfer, mmu, events),
            Mode::PixelTransfer => {
                self.render_scanline(mmu);
                self.enter(Mode::HBlank, mmu, events);
            }
            Mode::HBlank => {
                self.next_line(mmu, events);
                if self.line as usize == SCREEN_HEIGHT {
                    events.entered_vblank = true;
                    self.enter(Mode::VBlank, mmu, events);
                } else {
                    self.enter(Mode::OamSearch, mmu, events);
                }
            }
            Mode::VBlank => {
                if self.line + 1 == TOTAL_LINES {
                    self.line = 0;
                    self.frames += 1;
                    events.frame_complete = true;
                    self.check_coincidence(mmu, events);
                    self.enter(Mode::OamSearch, mmu, events);
                } else {
                    self.next_line(mmu, events);
                }
            }
        }
    }

    fn enter(&mut self, mode: Mode, mmu: &Mmu, events: &mut PpuEvents) {
        self.mode = mode;
        let stat = LcdStatus::new(mmu.peek(io::STAT));
        if let Some(source) = mode.stat_source() {
            if stat.enabled(source) {
                events.stat_interrupt = true;
            }
        }
    }

    fn next_line(&mut self, mmu: &Mmu, events: &mut PpuEvents) {
        self.line += 1;
        self.check_coincidence(mmu, events);
    }

    fn check_coincidence(&self, mmu: &Mmu, events: &mut PpuEvents) {
        let stat = LcdStatus::new(mmu.peek(io::STAT));
        if self.line == mmu.peek(io::LYC) && stat.enabled(LcdStatus::COINCIDENCE_INTERRUPT) {
            events.stat_interrupt = true;
        }
    }

    /// Render the background for the current line into the frame buffer
    fn render_scanline(&mut self, mmu: &Mmu) {
        let line = self.line as usize;
        if line >= SCREEN_HEIGHT {
            return;
        }

        let row = &mut self.frame_buffer[line * SCREEN_WIDTH..(line + 1) * SCREEN_WIDTH];
        let lcdc = LcdControl::new(mmu.peek(io::LCDC));
        if !lcdc.display_enabled() || !lcdc.background_enabled() {
            row.fill(Shade::White);
            return;
        }

        let vram = mmu.vram();
        let palette = mmu.peek(io::BGP);
        let y = (line as u8).wrapping_add(mmu.peek(io::SCY)) as usize;
        let scroll_x = mmu.peek(io::SCX);
        let map_row = lcdc.tile_map_base() + (y / 8) * 32;
        let tile_row = (y % 8) * 2;

        for (x, pixel) in row.iter_mut().enumerate() {
            let bg_x = (x as u8).wrapping_add(scroll_x) as usize;
            let tile_index = vram[map_row + bg_x / 8];
            let data = lcdc.tile_data_offset(tile_index) + tile_row;
            let lo = vram[data];
            let hi = vram[data + 1];
            let bit = 7 - (bg_x % 8);
            let color = (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1);
            *pixel = Shade::from_palette(palette, color);
        }
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Ppu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LY:{:3} mode:{} clock:{:3} frames:{}",
            self.line, self.mode, self.clock, self.frames
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Bus;

    #[test]
    fn test_scanline_mode_sequence() {
        let mmu = Mmu::new();
        let mut ppu = Ppu::new();
        assert_eq!(ppu.mode(), Mode::OamSearch);

        ppu.tick(80, &mmu);
        assert_eq!(ppu.mode(), Mode::PixelTransfer);
        ppu.tick(172, &mmu);
        assert_eq!(ppu.mode(), Mode::HBlank);
        ppu.tick(204, &mmu);
        assert_eq!(ppu.mode(), Mode::OamSearch);
        assert_eq!(ppu.scanline(), 1);
        assert_eq!(ppu.clock(), 0);
    }

    #[test]
    fn test_surplus_carries_over() {
        let mmu = Mmu::new();
        let mut ppu = Ppu::new();
        ppu.tick(84, &mmu);
        assert_eq!(ppu.mode(), Mode::PixelTransfer);
        assert_eq!(ppu.clock(), 4);
    }

    #[test]
    fn test_mode_entry_raises_stat_interrupt() {
        let mut mmu = Mmu::new();
        mmu.write(io::STAT, LcdStatus::HBLANK_INTERRUPT);
        let mut ppu = Ppu::new();
        assert!(!ppu.tick(80, &mmu).stat_interrupt);
        assert!(ppu.tick(172, &mmu).stat_interrupt);
    }

    #[test]
    fn test_background_render() {
        let mut mmu = Mmu::new();
        mmu.write(
            io::LCDC,
            LcdControl::DISPLAY_ENABLE | LcdControl::TILE_DATA | LcdControl::BG_ENABLE,
        );
        mmu.write(io::BGP, 0b11_10_01_00);
        // Tile 1: first row is colour 3 on the left half, colour 1 on the right
        mmu.write(0x8010, 0xFF);
        mmu.write(0x8011, 0xF0);
        mmu.write(0x9800, 0x01);

        let mut ppu = Ppu::new();
        ppu.tick(OAM_SEARCH_CYCLES + PIXEL_TRANSFER_CYCLES, &mmu);

        let row = &ppu.frame_buffer()[..SCREEN_WIDTH];
        assert_eq!(row[0], Shade::Black);
        assert_eq!(row[4], Shade::LightGray);
        assert_eq!(row[8], Shade::White);
    }

    #[test]
    fn test_display_disabled_renders_white() {
        let mut mmu = Mmu::new();
        mmu.write(io::BGP, 0xFF);
        mmu.write(0x8000, 0xFF);
        let mut ppu = Ppu::new();
        ppu.tick(OAM_SEARCH_CYCLES + PIXEL_TRANSFER_CYCLES, &mmu);
        assert!(ppu.frame_buffer()[..SCREEN_WIDTH].iter().all(|&s| s == Shade::White));
    }

    #[test]
    fn test_signed_tile_data_addressing() {
        let lcdc = LcdControl::new(0);
        assert_eq!(lcdc.tile_data_offset(0x00), 0x1000);
        assert_eq!(lcdc.tile_data_offset(0x80), 0x0800);
        assert_eq!(lcdc.tile_data_offset(0xFF), 0x0FF0);
        let lcdc = LcdControl::new(LcdControl::TILE_DATA);
        assert_eq!(lcdc.tile_data_offset(0xFF), 0x0FF0);
        assert_eq!(lcdc.tile_data_offset(0x01), 0x0010);
    }
}
