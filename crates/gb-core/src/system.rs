//! DMG System Integration
//!
//! The driver loop: execute one instruction, unmap the boot overlay once PC leaves it,
//! service at most one interrupt, then advance the PPU, divider and pacer by the
//! elapsed clock units.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::cartridge::{BootRom, Cartridge, LoadError, BOOT_ROM_SIZE};
use crate::clock::Pacer;
use crate::config::{SystemConfig, UnimplementedPolicy};
use crate::cpu::{Bus, Cpu, CpuError};
use crate::disasm::trace_line;
use crate::interrupts::{self, Interrupt};
use crate::mmu::{io, Mmu};
use crate::opcodes::{Opcode, CLOCKS_PER_MACHINE_CYCLE};
use crate::ppu::{Ppu, PpuEvents};

/// Cost charged for a skipped unimplemented opcode
pub const SKIPPED_CYCLES: u32 = CLOCKS_PER_MACHINE_CYCLE;

/// Errors surfaced by the driver
#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Cpu(#[from] CpuError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// What one driver step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// Address of the instruction, or PC while halted
    pub address: u16,
    /// Opcode executed, `None` while halted
    pub opcode: Option<Opcode>,
    /// Clock units elapsed, interrupt dispatch included
    pub cycles: u32,
    pub serviced: Option<Interrupt>,
    pub ppu: PpuEvents,
}

/// DMG System - integrates all components
#[derive(Debug, Clone)]
pub struct GameBoy {
    cpu: Cpu,
    mmu: Mmu,
    ppu: Ppu,
    pacer: Pacer,
    config: SystemConfig,
    /// Clock units since power-on
    cycles: u64,
}

impl GameBoy {
    /// Power-on state with an empty cartridge slot
    pub fn new(config: SystemConfig) -> Self {
        Self {
            cpu: Cpu::new(),
            mmu: Mmu::new(),
            ppu: Ppu::new(),
            pacer: Pacer::new(config.pacing),
            config,
            cycles: 0,
        }
    }

    /// Build from image files. Without a boot ROM the system starts in post-boot state.
    pub fn from_files(
        config: SystemConfig,
        boot_rom: Option<&Path>,
        cartridge: &Path,
    ) -> Result<Self, SystemError> {
        let mut system = Self::new(config);
        system.insert_cartridge(Cartridge::from_file(cartridge)?);
        match boot_rom {
            Some(path) => system.load_boot_rom(BootRom::from_file(path)?),
            None => system.skip_boot(),
        }
        Ok(system)
    }

    /// Map the boot program and restart the CPU at $0000
    pub fn load_boot_rom(&mut self, boot_rom: BootRom) {
        info!(bytes = BOOT_ROM_SIZE, "boot ROM loaded");
        self.mmu.load_boot_rom(boot_rom);
        self.cpu = Cpu::new();
    }

    pub fn insert_cartridge(&mut self, cartridge: Cartridge) {
        match cartridge.header() {
            Some(header) => info!(size = cartridge.len(), "cartridge loaded: {}", header),
            None => info!("cartridge slot empty"),
        }
        self.mmu.insert_cartridge(cartridge);
    }

    /// Start from the state the boot program hands over at $0100
    pub fn skip_boot(&mut self) {
        self.cpu = Cpu::post_boot();
        self.mmu.disable_boot_overlay();
        self.mmu.write(io::BOOT, 0x01);
        self.mmu.write(io::LCDC, 0x91);
        self.mmu.write(io::BGP, 0xFC);
    }

    /// Execute one instruction and advance every other component by its cost
    pub fn step(&mut self) -> Result<StepOutcome, CpuError> {
        let (address, opcode, mut cycles) = match self.cpu.step(&mut self.mmu) {
            Ok(executed) => (executed.address, executed.opcode, executed.cycles),
            Err(err) => match self.config.unimplemented {
                UnimplementedPolicy::Halt => return Err(err),
                UnimplementedPolicy::Skip => {
                    warn!("{}, skipping", err);
                    let CpuError::Unimplemented { opcode, address, .. } = err;
                    (address, Some(Opcode::normal(opcode)), SKIPPED_CYCLES)
                }
            },
        };

        if self.config.trace {
            if let Some(opcode) = opcode {
                trace!(target: "gb_core::trace", "{}", trace_line(address, opcode));
            }
            debug!(target: "gb_core::trace", "{}", self.cpu.registers());
        }

        if self.mmu.boot_overlay_enabled() && self.cpu.pc() >= BOOT_ROM_SIZE as u16 {
            self.mmu.disable_boot_overlay();
        }

        let serviced = interrupts::service(&mut self.cpu, &mut self.mmu);
        if let Some(serviced) = serviced {
            debug!(interrupt = ?serviced.interrupt, "interrupt serviced");
            cycles += serviced.cycles;
        }

        let events = self.ppu.tick(cycles, &self.mmu);
        self.mmu
            .sync_lcd_status(self.ppu.scanline(), self.ppu.mode().bits());
        self.mmu.advance_divider(cycles);
        if events.entered_vblank {
            interrupts::request(&mut self.mmu, Interrupt::VBlank);
        }
        if events.stat_interrupt {
            interrupts::request(&mut self.mmu, Interrupt::LcdStat);
        }

        self.cycles += cycles as u64;
        self.pacer.advance(cycles);

        Ok(StepOutcome {
            address,
            opcode,
            cycles,
            serviced: serviced.map(|s| s.interrupt),
            ppu: events,
        })
    }

    /// Run until the PPU completes a frame. Returns the clock units spent.
    pub fn run_frame(&mut self) -> Result<u64, SystemError> {
        let start = self.cycles;
        loop {
            let outcome = self.step()?;
            if outcome.ppu.frame_complete {
                return Ok(self.cycles - start);
            }
        }
    }

    /// Run for N frames
    pub fn run_frames(&mut self, frames: u64) -> Result<(), SystemError> {
        for _ in 0..frames {
            self.run_frame()?;
        }
        Ok(())
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn mmu(&self) -> &Mmu {
        &self.mmu
    }

    pub fn mmu_mut(&mut self) -> &mut Mmu {
        &mut self.mmu
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Clock units since power-on
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Completed frames
    pub fn frame_count(&self) -> u64 {
        self.ppu.frames()
    }
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new(SystemConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::ROM_BANK_SIZE;

    fn rom_with_program(program: &[u8]) -> Cartridge {
        let mut rom = vec![0; 2 * ROM_BANK_SIZE];
        rom[0x100..0x100 + program.len()].copy_from_slice(program);
        Cartridge::from_rom(rom).unwrap()
    }

    #[test]
    fn test_skip_boot_state() {
        let mut gb = GameBoy::default();
        gb.insert_cartridge(rom_with_program(&[0x00]));
        gb.skip_boot();
        assert_eq!(gb.cpu().pc(), 0x100);
        assert_eq!(gb.cpu().registers().af.value(), 0x01B0);
        assert!(!gb.mmu().boot_overlay_enabled());
        assert_eq!(gb.mmu().peek(io::LCDC), 0x91);
    }

    #[test]
    fn test_step_reports_cycles() {
        let mut gb = GameBoy::default();
        gb.insert_cartridge(rom_with_program(&[0x00, 0xC3, 0x00, 0x01]));
        gb.skip_boot();
        assert_eq!(gb.step().unwrap().cycles, 4);
        assert_eq!(gb.step().unwrap().cycles, 16);
        assert_eq!(gb.cycles(), 20);
        assert_eq!(gb.cpu().pc(), 0x100);
    }

    #[test]
    fn test_unimplemented_halts_by_default() {
        let mut gb = GameBoy::default();
        gb.insert_cartridge(rom_with_program(&[0xFD]));
        gb.skip_boot();
        let err = gb.step().unwrap_err();
        assert!(matches!(err, CpuError::Unimplemented { opcode: 0xFD, .. }));
    }

    #[test]
    fn test_unimplemented_skip_policy() {
        let mut gb = GameBoy::new(SystemConfig {
            unimplemented: UnimplementedPolicy::Skip,
            ..SystemConfig::default()
        });
        gb.insert_cartridge(rom_with_program(&[0xFD, 0x00]));
        gb.skip_boot();
        let outcome = gb.step().unwrap();
        assert_eq!(outcome.cycles, SKIPPED_CYCLES);
        assert_eq!(gb.cpu().pc(), 0x101);
        gb.step().unwrap();
        assert_eq!(gb.cpu().pc(), 0x102);
    }

    #[test]
    fn test_run_frame_takes_one_frame() {
        // JR -2
        let mut gb = GameBoy::default();
        gb.insert_cartridge(rom_with_program(&[0x18, 0xFE]));
        gb.skip_boot();
        let cycles = gb.run_frame().unwrap();
        assert!(cycles >= crate::ppu::FRAME_CYCLES as u64);
        assert_eq!(gb.frame_count(), 1);
        assert_eq!(gb.ppu().scanline(), 0);
    }
}
