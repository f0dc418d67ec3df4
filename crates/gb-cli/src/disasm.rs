//! DMG disassembler - prints one line per instruction

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use gb_core::disasm::disassemble;

/// DMG Disassembler
#[derive(Parser, Debug)]
#[command(name = "gb-disasm")]
#[command(about = "Disassembles a DMG boot ROM or cartridge image", long_about = None)]
struct Args {
    /// Image to disassemble
    file: PathBuf,

    /// Offset into the image to start at; may point past 64 KiB into later banks
    #[arg(short, long, default_value = "0", value_parser = parse_offset)]
    start: usize,

    /// Address the byte at --start is mapped at (default: the start offset)
    #[arg(short, long, value_parser = parse_address)]
    base: Option<u16>,

    /// Maximum number of instructions to print
    #[arg(short = 'n', long)]
    count: Option<usize>,
}

/// Accepts decimal, `0x`-prefixed or `$`-prefixed hexadecimal
fn parse_offset(value: &str) -> Result<usize, String> {
    let parsed = if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix('$')) {
        usize::from_str_radix(hex, 16)
    } else {
        value.parse()
    };
    parsed.map_err(|e| format!("invalid offset {:?}: {}", value, e))
}

fn parse_address(value: &str) -> Result<u16, String> {
    let offset = parse_offset(value)?;
    u16::try_from(offset).map_err(|_| format!("address {:?} is past $FFFF", value))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let image = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let start = args.start;
    if start >= image.len() {
        bail!("start offset 0x{:X} is past the end of a {}-byte image", start, image.len());
    }
    let base = match args.base {
        Some(base) => base,
        None => u16::try_from(start).with_context(|| {
            format!("start offset 0x{:X} is past 64 KiB; pass --base", start)
        })?,
    };

    // Only one 64 KiB window is listed per run
    let listing = disassemble(&image[start..], base);
    let count = args.count.unwrap_or(listing.len());
    for instruction in listing.iter().take(count) {
        println!("{}", instruction);
    }

    Ok(())
}
