//! Memory-mapped address decoder
//!
//! The DMG memory map:
//! $0000-$00FF - Boot overlay (while enabled), otherwise ROM bank 0
//! $0000-$3FFF - ROM bank 0
//! $4000-$7FFF - ROM bank N
//! $8000-$9FFF - VRAM
//! $A000-$BFFF - External RAM
//! $C000-$DFFF - Work RAM
//! $E000-$FDFF - Echo of work RAM
//! $FE00-$FE9F - OAM
//! $FEA0-$FEFF - Unusable, reads 0
//! $FF00-$FF7F - I/O registers
//! $FF80-$FFFE - High RAM
//! $FFFF       - Interrupt enable

use tracing::info;

use crate::cartridge::{BootRom, Cartridge};
use crate::cpu::Bus;

pub const VRAM_SIZE: usize = 0x2000;
pub const EXTERNAL_RAM_SIZE: usize = 0x2000;
pub const WORK_RAM_SIZE: usize = 0x2000;
pub const OAM_SIZE: usize = 0xA0;

/// Clock units per DIV increment
const DIVIDER_PERIOD: u32 = 256;

/// I/O register addresses
pub mod io {
    pub const JOYP: u16 = 0xFF00;
    pub const DIV: u16 = 0xFF04;
    pub const IF: u16 = 0xFF0F;
    pub const LCDC: u16 = 0xFF40;
    pub const STAT: u16 = 0xFF41;
    pub const SCY: u16 = 0xFF42;
    pub const SCX: u16 = 0xFF43;
    pub const LY: u16 = 0xFF44;
    pub const LYC: u16 = 0xFF45;
    pub const BGP: u16 = 0xFF47;
    pub const BOOT: u16 = 0xFF50;
    pub const IE: u16 = 0xFFFF;
}

/// STAT bits owned by the PPU: mode (0-1) and LY=LYC coincidence (2)
const STAT_READ_ONLY: u8 = 0x07;
/// STAT bits the CPU may write: interrupt sources (3-6)
const STAT_WRITABLE: u8 = 0x78;
const STAT_COINCIDENCE: u8 = 0x04;
const STAT_UNUSED: u8 = 0x80;

/// Memory management unit
#[derive(Debug, Clone)]
pub struct Mmu {
    boot_rom: Option<BootRom>,
    boot_overlay: bool,
    cartridge: Cartridge,
    vram: Box<[u8]>,
    external_ram: Box<[u8]>,
    work_ram: Box<[u8]>,
    oam: Box<[u8]>,
    /// $FF00-$FFFF: I/O registers, high RAM and IE
    high: [u8; 0x100],
    divider_clock: u32,
}

impl Mmu {
    /// Create a decoder with an empty cartridge slot and no boot overlay
    pub fn new() -> Self {
        Self {
            boot_rom: None,
            boot_overlay: false,
            cartridge: Cartridge::empty(),
            vram: vec![0; VRAM_SIZE].into_boxed_slice(),
            external_ram: vec![0; EXTERNAL_RAM_SIZE].into_boxed_slice(),
            work_ram: vec![0; WORK_RAM_SIZE].into_boxed_slice(),
            oam: vec![0; OAM_SIZE].into_boxed_slice(),
            high: [0; 0x100],
            divider_clock: 0,
        }
    }

    /// Map a boot program over $0000-$00FF
    pub fn load_boot_rom(&mut self, boot_rom: BootRom) {
        self.boot_rom = Some(boot_rom);
        self.boot_overlay = true;
        self.high[offset(io::BOOT)] = 0;
    }

    pub fn insert_cartridge(&mut self, cartridge: Cartridge) {
        self.cartridge = cartridge;
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    pub fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cartridge
    }

    /// Whether reads below $0100 come from the boot program
    pub fn boot_overlay_enabled(&self) -> bool {
        self.boot_overlay && self.boot_rom.is_some()
    }

    /// Unmap the boot overlay; bank 0 becomes visible at $0000-$00FF
    pub fn disable_boot_overlay(&mut self) {
        if self.boot_overlay {
            self.boot_overlay = false;
            info!("boot overlay unmapped");
        }
    }

    /// Side-effect-free read used by the PPU and debug dumps
    pub fn peek(&self, address: u16) -> u8 {
        match address {
            0x0000..=0x00FF if self.boot_overlay => match &self.boot_rom {
                Some(boot_rom) => boot_rom.read(address as u8),
                None => self.cartridge.read_bank0(address),
            },
            0x0000..=0x3FFF => self.cartridge.read_bank0(address),
            0x4000..=0x7FFF => self.cartridge.read_bank_n(address - 0x4000),
            0x8000..=0x9FFF => self.vram[(address - 0x8000) as usize],
            0xA000..=0xBFFF => self.external_ram[(address - 0xA000) as usize],
            0xC000..=0xDFFF => self.work_ram[(address - 0xC000) as usize],
            0xE000..=0xFDFF => self.work_ram[(address - 0xE000) as usize],
            0xFE00..=0xFE9F => self.oam[(address - 0xFE00) as usize],
            0xFEA0..=0xFEFF => 0,
            0xFF00..=0xFF7F => self.read_io(address),
            0xFF80..=0xFFFF => self.high[offset(address)],
        }
    }

    fn read_io(&self, address: u16) -> u8 {
        let value = self.high[offset(address)];
        match address {
            // No buttons pressed: all input lines read high
            io::JOYP => 0xC0 | (value & 0x30) | 0x0F,
            io::IF => value | 0xE0,
            io::STAT => value | STAT_UNUSED,
            _ => value,
        }
    }

    fn write_io(&mut self, address: u16, value: u8) {
        let slot = offset(address);
        match address {
            io::JOYP => self.high[slot] = value & 0x30,
            io::DIV => {
                self.high[slot] = 0;
                self.divider_clock = 0;
            }
            io::IF => self.high[slot] = value & 0x1F,
            io::STAT => {
                self.high[slot] = (self.high[slot] & STAT_READ_ONLY) | (value & STAT_WRITABLE)
            }
            io::LY => {}
            io::BOOT => {
                self.high[slot] = value;
                if value != 0 {
                    self.disable_boot_overlay();
                }
            }
            _ => self.high[slot] = value,
        }
    }

    /// Mirror the PPU's scanline and mode into LY and STAT. Returns whether
    /// LY matches LYC.
    pub fn sync_lcd_status(&mut self, ly: u8, mode: u8) -> bool {
        self.high[offset(io::LY)] = ly;
        let coincidence = ly == self.high[offset(io::LYC)];
        let coincidence_bit = if coincidence { STAT_COINCIDENCE } else { 0 };
        let stat = &mut self.high[offset(io::STAT)];
        *stat = (*stat & STAT_WRITABLE) | coincidence_bit | (mode & 0x03);
        coincidence
    }

    /// Advance DIV by elapsed clock units
    pub fn advance_divider(&mut self, cycles: u32) {
        self.divider_clock += cycles;
        let ticks = self.divider_clock / DIVIDER_PERIOD;
        self.divider_clock %= DIVIDER_PERIOD;
        let div = &mut self.high[offset(io::DIV)];
        *div = div.wrapping_add(ticks as u8);
    }

    /// Video RAM, $8000-$9FFF
    pub fn vram(&self) -> &[u8] {
        &self.vram
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for Mmu {
    fn read(&mut self, address: u16) -> u8 {
        self.peek(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            // Boot overlay and ROM are read-only
            0x0000..=0x7FFF => {}
            0x8000..=0x9FFF => self.vram[(address - 0x8000) as usize] = value,
            0xA000..=0xBFFF => self.external_ram[(address - 0xA000) as usize] = value,
            0xC000..=0xDFFF => self.work_ram[(address - 0xC000) as usize] = value,
            0xE000..=0xFDFF => self.work_ram[(address - 0xE000) as usize] = value,
            0xFE00..=0xFE9F => self.oam[(address - 0xFE00) as usize] = value,
            0xFEA0..=0xFEFF => {}
            0xFF00..=0xFF7F => self.write_io(address, value),
            0xFF80..=0xFFFF => self.high[offset(address)] = value,
        }
    }
}

/// Index into the $FF00-$FFFF block
fn offset(address: u16) -> usize {
    (address - 0xFF00) as usize
}
