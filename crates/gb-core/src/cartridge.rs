//! Cartridge and boot ROM images
//!
//! The cartridge backs the two 16 KiB ROM windows: bank 0 at $0000-$3FFF and a
//! selectable bank N at $4000-$7FFF. Bank switching is a plain index set through
//! [`Cartridge::select_rom_bank`]; no MBC register decoding is done.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Size of one switchable ROM bank
pub const ROM_BANK_SIZE: usize = 0x4000;

/// Bytes of the boot image mapped over the start of bank 0
pub const BOOT_ROM_SIZE: usize = 0x100;

/// Header occupies $0100-$014F
pub const HEADER_END: usize = 0x150;

const TITLE_START: usize = 0x134;
const TITLE_END: usize = 0x144;
const CARTRIDGE_TYPE: usize = 0x147;
const ROM_SIZE: usize = 0x148;
const HEADER_CHECKSUM: usize = 0x14D;

/// Value read from bytes the image does not cover
const OPEN_BUS: u8 = 0xFF;

/// Cartridge parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartridgeError {
    #[error("cartridge image is {0} bytes, too short to hold a header")]
    TooShort(usize),
}

/// Errors raised while loading images from disk
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("boot ROM is {0} bytes, expected at least 256")]
    BootRomTooShort(usize),
    #[error("invalid cartridge: {0}")]
    Cartridge(#[from] CartridgeError),
}

fn read_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Cartridge header fields at $0134-$014D
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeHeader {
    /// Upper-case ASCII title, NUL padding stripped
    pub title: String,
    /// Cartridge type byte ($0147)
    pub cartridge_type: u8,
    /// ROM size code ($0148); size is 32 KiB << code
    pub rom_size_code: u8,
    /// Checksum stored in the header ($014D)
    pub header_checksum: u8,
    /// Checksum computed over $0134-$014C
    pub computed_checksum: u8,
}

impl CartridgeHeader {
    /// Parse the header from a full cartridge image
    pub fn parse(rom: &[u8]) -> Result<Self, CartridgeError> {
        if rom.len() < HEADER_END {
            return Err(CartridgeError::TooShort(rom.len()));
        }

        let title = rom[TITLE_START..TITLE_END]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
            .collect::<String>()
            .trim_end()
            .to_string();

        let computed_checksum = rom[TITLE_START..HEADER_CHECKSUM]
            .iter()
            .fold(0u8, |x, &b| x.wrapping_sub(b).wrapping_sub(1));

        Ok(Self {
            title,
            cartridge_type: rom[CARTRIDGE_TYPE],
            rom_size_code: rom[ROM_SIZE],
            header_checksum: rom[HEADER_CHECKSUM],
            computed_checksum,
        })
    }

    /// Declared ROM size in bytes, `None` for codes outside 0..=8
    pub fn rom_size(&self) -> Option<usize> {
        (self.rom_size_code <= 8).then(|| (32 * 1024) << self.rom_size_code)
    }

    /// Whether the stored header checksum matches the computed one
    pub fn checksum_valid(&self) -> bool {
        self.header_checksum == self.computed_checksum
    }
}

impl fmt::Display for CartridgeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" type=0x{:02X} rom_size_code=0x{:02X} checksum=0x{:02X} ({})",
            self.title,
            self.cartridge_type,
            self.rom_size_code,
            self.header_checksum,
            if self.checksum_valid() { "ok" } else { "mismatch" }
        )
    }
}

/// Cartridge image with a fixed bank 0 and one selectable bank
#[derive(Debug, Clone)]
pub struct Cartridge {
    header: Option<CartridgeHeader>,
    rom: Vec<u8>,
    /// Bank mapped at $4000-$7FFF, never 0
    rom_bank: usize,
}

impl Cartridge {
    /// Create a cartridge from a full ROM image
    pub fn from_rom(rom: Vec<u8>) -> Result<Self, CartridgeError> {
        let header = CartridgeHeader::parse(&rom)?;
        Ok(Self {
            header: Some(header),
            rom,
            rom_bank: 1,
        })
    }

    /// Load a cartridge image from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let rom = read_file(path.as_ref())?;
        Ok(Self::from_rom(rom)?)
    }

    /// An empty slot: every ROM read returns 0xFF
    pub fn empty() -> Self {
        Self {
            header: None,
            rom: Vec::new(),
            rom_bank: 1,
        }
    }

    /// Parsed header, `None` for an empty slot
    pub fn header(&self) -> Option<&CartridgeHeader> {
        self.header.as_ref()
    }

    /// Raw image length in bytes
    pub fn len(&self) -> usize {
        self.rom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rom.is_empty()
    }

    /// Read from bank 0; `offset` is taken modulo the bank size
    pub fn read_bank0(&self, offset: u16) -> u8 {
        let index = offset as usize % ROM_BANK_SIZE;
        self.rom.get(index).copied().unwrap_or(OPEN_BUS)
    }

    /// Read from the selected bank N; `offset` is relative to $4000
    pub fn read_bank_n(&self, offset: u16) -> u8 {
        let index = self.rom_bank * ROM_BANK_SIZE + offset as usize % ROM_BANK_SIZE;
        self.rom.get(index).copied().unwrap_or(OPEN_BUS)
    }

    /// Select the bank mapped at $4000-$7FFF. Bank 0 selects bank 1.
    pub fn select_rom_bank(&mut self, bank: usize) {
        self.rom_bank = bank.max(1);
    }

    pub fn rom_bank(&self) -> usize {
        self.rom_bank
    }
}

impl Default for Cartridge {
    fn default() -> Self {
        Self::empty()
    }
}

/// Boot program overlaid on $0000-$00FF until unmapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootRom {
    bytes: [u8; BOOT_ROM_SIZE],
}

impl BootRom {
    /// Build from an image; only the first 256 bytes are used
    pub fn from_bytes(image: &[u8]) -> Result<Self, LoadError> {
        if image.len() < BOOT_ROM_SIZE {
            return Err(LoadError::BootRomTooShort(image.len()));
        }
        let mut bytes = [0; BOOT_ROM_SIZE];
        bytes.copy_from_slice(&image[..BOOT_ROM_SIZE]);
        Ok(Self { bytes })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let image = read_file(path.as_ref())?;
        Self::from_bytes(&image)
    }

    pub fn read(&self, address: u8) -> u8 {
        self.bytes[address as usize]
    }
}
