//! DMG Core - Pure Rust DMG handheld emulator library
//!
//! This crate provides the processing core of the 1989 DMG handheld: the LR35902 CPU,
//! the memory-mapped address decoder, the interrupt controller and the PPU timing
//! state machine. It has no windowing or audio dependencies.

#![forbid(unsafe_code)]

/// Register file and flag model
pub mod registers;
/// Mnemonic, cycle and length tables for both opcode pages
pub mod opcodes;
/// Pure opcode decoding into instruction descriptors
pub mod instruction;
/// CPU module containing the LR35902 implementation
pub mod cpu;
/// Cartridge and boot ROM images
pub mod cartridge;
/// Memory-mapped address decoder
pub mod mmu;
/// Interrupt controller
pub mod interrupts;
/// PPU timing state machine and background renderer
pub mod ppu;
/// Disassembly and trace formatting
pub mod disasm;
/// Driver configuration
pub mod config;
/// Wall-clock pacing
pub mod clock;
/// Integration module for the complete system
pub mod system;

pub use cartridge::{BootRom, Cartridge, CartridgeError, LoadError};
pub use config::{Pacing, SystemConfig, UnimplementedPolicy};
pub use cpu::{Bus, Cpu, CpuError};
pub use system::{GameBoy, StepOutcome, SystemError};
