//! Interrupt controller
//!
//! Five sources share IE ($FFFF) and IF ($FF0F). Lower bit numbers have priority,
//! and at most one interrupt is serviced per call.

use crate::cpu::{Bus, Cpu};
use crate::mmu::io;
use crate::opcodes::CLOCKS_PER_MACHINE_CYCLE;

pub const IE_ADDR: u16 = io::IE;
pub const IF_ADDR: u16 = io::IF;

/// Meaningful bits of IE and IF
pub const INTERRUPT_MASK: u8 = 0x1F;

/// Dispatch cost in machine cycles
pub const SERVICE_MACHINE_CYCLES: u32 = 5;
pub const SERVICE_CYCLES: u32 = SERVICE_MACHINE_CYCLES * CLOCKS_PER_MACHINE_CYCLE;

/// Interrupt sources in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    VBlank = 0,
    LcdStat = 1,
    Timer = 2,
    Serial = 3,
    Joypad = 4,
}

impl Interrupt {
    pub const ALL: [Interrupt; 5] = [
        Interrupt::VBlank,
        Interrupt::LcdStat,
        Interrupt::Timer,
        Interrupt::Serial,
        Interrupt::Joypad,
    ];

    pub fn bit(self) -> u8 {
        self as u8
    }

    pub fn mask(self) -> u8 {
        1 << self.bit()
    }

    /// Handler address: $40 + 8 * bit
    pub fn vector(self) -> u16 {
        0x40 + 8 * self.bit() as u16
    }
}

/// Interrupt taken by [`service`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Serviced {
    pub interrupt: Interrupt,
    /// Clock units spent on the dispatch
    pub cycles: u32,
}

/// Raise an interrupt request by setting its IF bit
pub fn request(bus: &mut impl Bus, interrupt: Interrupt) {
    let flags = bus.read(IF_ADDR);
    bus.write(IF_ADDR, flags | interrupt.mask());
}

/// Enabled and requested sources (IE & IF)
pub fn pending(bus: &mut impl Bus) -> u8 {
    bus.read(IE_ADDR) & bus.read(IF_ADDR) & INTERRUPT_MASK
}

/// Service the highest-priority pending interrupt, if IME allows it.
///
/// Any pending interrupt wakes a halted CPU, even while IME is clear.
pub fn service(cpu: &mut Cpu, bus: &mut impl Bus) -> Option<Serviced> {
    let pending = pending(bus);
    if pending == 0 {
        return None;
    }
    cpu.wake();

    if !cpu.ime() {
        return None;
    }

    let interrupt = Interrupt::ALL
        .into_iter()
        .find(|interrupt| pending & interrupt.mask() != 0)?;

    cpu.set_ime(false);
    let flags = bus.read(IF_ADDR);
    bus.write(IF_ADDR, flags & !interrupt.mask());
    let pc = cpu.pc();
    cpu.push16(bus, pc);
    cpu.set_pc(interrupt.vector());

    Some(Serviced {
        interrupt,
        cycles: SERVICE_CYCLES,
    })
}
