//! Address decoder tests for the DMG emulator

use gb_core::cartridge::{BootRom, Cartridge, ROM_BANK_SIZE};
use gb_core::cpu::Bus;
use gb_core::mmu::{io, Mmu};

fn cartridge(banks: usize) -> Cartridge {
    let mut rom = vec![0; banks * ROM_BANK_SIZE];
    for bank in 0..banks {
        rom[bank * ROM_BANK_SIZE] = bank as u8;
    }
    rom[0x0001] = 0xC0;
    Cartridge::from_rom(rom).unwrap()
}

fn boot_rom() -> BootRom {
    BootRom::from_bytes(&[0xB0; 0x100]).unwrap()
}

#[test]
fn test_boot_overlay_covers_first_page() {
    let mut mmu = Mmu::new();
    mmu.insert_cartridge(cartridge(2));
    mmu.load_boot_rom(boot_rom());

    assert!(mmu.boot_overlay_enabled());
    assert_eq!(mmu.read(0x0001), 0xB0);
    assert_eq!(mmu.read(0x00FF), 0xB0);
    // The overlay stops at $0100
    assert_eq!(mmu.read(0x0100), 0x00);

    mmu.disable_boot_overlay();
    assert!(!mmu.boot_overlay_enabled());
    assert_eq!(mmu.read(0x0001), 0xC0);
}

#[test]
fn test_boot_register_unmaps_overlay() {
    let mut mmu = Mmu::new();
    mmu.insert_cartridge(cartridge(2));
    mmu.load_boot_rom(boot_rom());

    mmu.write(io::BOOT, 0x00);
    assert!(mmu.boot_overlay_enabled());
    mmu.write(io::BOOT, 0x01);
    assert!(!mmu.boot_overlay_enabled());
    assert_eq!(mmu.read(0x0001), 0xC0);
}

#[test]
fn test_rom_writes_are_ignored() {
    let mut mmu = Mmu::new();
    mmu.insert_cartridge(cartridge(2));
    mmu.write(0x0001, 0x12);
    mmu.write(0x4000, 0x34);
    assert_eq!(mmu.read(0x0001), 0xC0);
    assert_eq!(mmu.read(0x4000), 0x01);
}

#[test]
fn test_switchable_bank() {
    let mut mmu = Mmu::new();
    mmu.insert_cartridge(cartridge(4));
    assert_eq!(mmu.read(0x4000), 1);
    mmu.cartridge_mut().select_rom_bank(3);
    assert_eq!(mmu.read(0x4000), 3);
    assert_eq!(mmu.read(0x0000), 0);
}

#[test]
fn test_empty_slot_reads_open_bus() {
    let mut mmu = Mmu::new();
    assert_eq!(mmu.read(0x0150), 0xFF);
    assert_eq!(mmu.read(0x7FFF), 0xFF);
}

#[test]
fn test_echo_aliases_work_ram() {
    let mut mmu = Mmu::new();
    for offset in [0x0000u16, 0x0ABC, 0x1DFF] {
        mmu.write(0xE000 + offset, offset as u8 ^ 0x5A);
        assert_eq!(mmu.read(0xC000 + offset), offset as u8 ^ 0x5A);
    }
}

#[test]
fn test_ram_regions_hold_values() {
    let mut mmu = Mmu::new();
    for address in [0x8000u16, 0x9FFF, 0xA000, 0xBFFF, 0xFE00, 0xFF80, 0xFFFE] {
        mmu.write(address, 0x3C);
        assert_eq!(mmu.read(address), 0x3C, "{:04X}", address);
    }
}

#[test]
fn test_oam_guard() {
    let mut mmu = Mmu::new();
    for address in 0xFEA0..=0xFEFFu16 {
        mmu.write(address, 0xFF);
        assert_eq!(mmu.read(address), 0);
    }
}

#[test]
fn test_joypad_reads_no_buttons() {
    let mut mmu = Mmu::new();
    mmu.write(io::JOYP, 0x20);
    assert_eq!(mmu.read(io::JOYP), 0xC0 | 0x20 | 0x0F);
    mmu.write(io::JOYP, 0xFF);
    assert_eq!(mmu.read(io::JOYP), 0xFF);
}

#[test]
fn test_interrupt_flag_upper_bits() {
    let mut mmu = Mmu::new();
    assert_eq!(mmu.read(io::IF), 0xE0);
    mmu.write(io::IF, 0x01);
    assert_eq!(mmu.read(io::IF), 0xE1);
}

#[test]
fn test_div_write_resets() {
    let mut mmu = Mmu::new();
    mmu.advance_divider(256 * 5);
    assert_eq!(mmu.read(io::DIV), 5);
    mmu.write(io::DIV, 0xAB);
    assert_eq!(mmu.read(io::DIV), 0);
}
