//! DMG CLI - Command line runner for the DMG emulator core

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gb_core::config::{Pacing, SystemConfig, UnimplementedPolicy};
use gb_core::ppu::{Shade, SCREEN_HEIGHT, SCREEN_WIDTH};
use gb_core::system::{GameBoy, SystemError};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// What to do when the CPU hits an opcode with no handler
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnUnimplemented {
    /// Stop with an error
    Halt,
    /// Warn and continue
    Skip,
}

impl From<OnUnimplemented> for UnimplementedPolicy {
    fn from(value: OnUnimplemented) -> Self {
        match value {
            OnUnimplemented::Halt => UnimplementedPolicy::Halt,
            OnUnimplemented::Skip => UnimplementedPolicy::Skip,
        }
    }
}

/// DMG Emulator CLI
#[derive(Parser, Debug)]
#[command(name = "gb-cli")]
#[command(about = "Runs a DMG cartridge on the emulator core", long_about = None)]
struct Args {
    /// Path to the 256-byte boot ROM; without it execution starts at $0100
    #[arg(short, long)]
    boot_rom: Option<PathBuf>,

    /// Path to the cartridge image
    #[arg(short, long)]
    cartridge: PathBuf,

    /// Trace every instruction and register state
    #[arg(short, long)]
    debug: bool,

    /// Stop after this many frames (default: run until an error)
    #[arg(short, long)]
    frames: Option<u64>,

    /// Run unthrottled instead of at the DMG clock rate
    #[arg(long)]
    fast: bool,

    /// Policy for opcodes with no handler
    #[arg(long, value_enum, default_value = "halt")]
    on_unimplemented: OnUnimplemented,

    /// Dump CPU state after execution
    #[arg(long)]
    dump_cpu: bool,

    /// Dump PPU state after execution
    #[arg(long)]
    dump_ppu: bool,
}

impl Args {
    fn system_config(&self) -> SystemConfig {
        SystemConfig {
            pacing: if self.fast {
                Pacing::Unthrottled
            } else {
                Pacing::realtime()
            },
            unimplemented: self.on_unimplemented.into(),
            trace: self.debug,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_directive = if args.debug { "gb_core=trace" } else { "gb_core=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("gb-cli v{}", env!("CARGO_PKG_VERSION"));

    let mut system = GameBoy::from_files(
        args.system_config(),
        args.boot_rom.as_deref(),
        &args.cartridge,
    )
    .with_context(|| format!("failed to load {}", args.cartridge.display()))?;

    let result = match args.frames {
        Some(frames) => {
            info!(frames, "running");
            system.run_frames(frames)
        }
        None => run_forever(&mut system),
    };

    if args.dump_cpu {
        dump_cpu_state(&system);
    }
    if args.dump_ppu {
        dump_ppu_state(&system);
    }

    result.context("emulation stopped")?;
    info!(frames = system.frame_count(), cycles = system.cycles(), "completed");
    Ok(())
}

fn run_forever(system: &mut GameBoy) -> Result<(), SystemError> {
    loop {
        system.run_frame()?;
    }
}

fn dump_cpu_state(system: &GameBoy) {
    let cpu = system.cpu();

    println!("\nCPU State:");
    println!("  {}", cpu.registers());
    println!("  IME:    {}", cpu.ime());
    println!("  Halted: {}", cpu.halted());
    println!("  Cycles: {}", system.cycles());
}

fn dump_ppu_state(system: &GameBoy) {
    let ppu = system.ppu();

    println!("\nPPU State:");
    println!("  {}", ppu);

    // Coarse preview: one character per 4x8 block
    let glyph = |shade: Shade| match shade {
        Shade::White => ' ',
        Shade::LightGray => '.',
        Shade::DarkGray => '+',
        Shade::Black => '#',
    };
    let frame = ppu.frame_buffer();
    for y in (0..SCREEN_HEIGHT).step_by(8) {
        let line: String = (0..SCREEN_WIDTH)
            .step_by(4)
            .map(|x| glyph(frame[y * SCREEN_WIDTH + x]))
            .collect();
        println!("  |{}|", line);
    }
}
