//! Register file and flag model
//!
//! The DMG CPU exposes four 16-bit register pairs (AF, BC, DE, HL), each addressable
//! as two 8-bit halves, plus a 16-bit stack pointer and program counter.
//! The low nibble of F is hard-wired to zero.

use std::fmt;

/// Mask applied to AF: only the upper nibble of F is backed by hardware.
pub const FLAG_REGISTER_MASK: u16 = 0xFFF0;

/// A 16-bit register addressable as high/low bytes, with an optional write mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    value: u16,
    mask: Option<u16>,
}

impl Register {
    /// Create an unmasked register
    pub const fn new(value: u16) -> Self {
        Self { value, mask: None }
    }

    /// Create a register whose value is ANDed with `mask` after every write
    pub const fn with_mask(value: u16, mask: u16) -> Self {
        Self {
            value: value & mask,
            mask: Some(mask),
        }
    }

    /// Full 16-bit value
    pub fn value(&self) -> u16 {
        self.value
    }

    /// High byte
    pub fn hi(&self) -> u8 {
        (self.value >> 8) as u8
    }

    /// Low byte
    pub fn lo(&self) -> u8 {
        self.value as u8
    }

    pub fn set(&mut self, value: u16) {
        self.value = value;
        self.apply_mask();
    }

    pub fn set_hi(&mut self, value: u8) {
        self.value = (self.value & 0x00FF) | ((value as u16) << 8);
        self.apply_mask();
    }

    pub fn set_lo(&mut self, value: u8) {
        self.value = (self.value & 0xFF00) | value as u16;
        self.apply_mask();
    }

    /// Wrapping increment, no flag effects
    pub fn increment(&mut self) {
        self.set(self.value.wrapping_add(1));
    }

    /// Wrapping decrement, no flag effects
    pub fn decrement(&mut self) {
        self.set(self.value.wrapping_sub(1));
    }

    fn apply_mask(&mut self) {
        if let Some(mask) = self.mask {
            self.value &= mask;
        }
    }
}

impl Default for Register {
    fn default() -> Self {
        Self::new(0)
    }
}

/// CPU flags and their bit positions inside F
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Zero = 7,
    Subtract = 6,
    HalfCarry = 5,
    Carry = 4,
}

impl Flag {
    /// Bit mask of this flag inside F
    pub const fn mask(self) -> u8 {
        1 << self as u8
    }
}

/// CPU register file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub af: Register,
    pub bc: Register,
    pub de: Register,
    pub hl: Register,
    pub sp: Register,
    pub pc: u16,
}

impl Registers {
    /// Power-on state: everything zero, execution starts in the boot overlay
    pub fn new() -> Self {
        Self {
            af: Register::with_mask(0, FLAG_REGISTER_MASK),
            bc: Register::new(0),
            de: Register::new(0),
            hl: Register::new(0),
            sp: Register::new(0),
            pc: 0,
        }
    }

    /// State left behind by the DMG boot program when it hands over at $0100
    pub fn post_boot() -> Self {
        Self {
            af: Register::with_mask(0x01B0, FLAG_REGISTER_MASK),
            bc: Register::new(0x0013),
            de: Register::new(0x00D8),
            hl: Register::new(0x014D),
            sp: Register::new(0xFFFE),
            pc: 0x0100,
        }
    }

    /// Accumulator
    pub fn a(&self) -> u8 {
        self.af.hi()
    }

    pub fn set_a(&mut self, value: u8) {
        self.af.set_hi(value);
    }

    /// Flag register
    pub fn f(&self) -> u8 {
        self.af.lo()
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.af.lo() & flag.mask() != 0
    }

    pub fn set_flag(&mut self, flag: Flag, on: bool) {
        let flags = self.af.lo();
        let flags = if on { flags | flag.mask() } else { flags & !flag.mask() };
        self.af.set_lo(flags);
    }

    /// Set all four flags at once (Z, N, H, C)
    pub fn set_flags(&mut self, zero: bool, subtract: bool, half_carry: bool, carry: bool) {
        self.set_flag(Flag::Zero, zero);
        self.set_flag(Flag::Subtract, subtract);
        self.set_flag(Flag::HalfCarry, half_carry);
        self.set_flag(Flag::Carry, carry);
    }

    pub fn zero(&self) -> bool {
        self.flag(Flag::Zero)
    }

    pub fn subtract(&self) -> bool {
        self.flag(Flag::Subtract)
    }

    pub fn half_carry(&self) -> bool {
        self.flag(Flag::HalfCarry)
    }

    pub fn carry(&self) -> bool {
        self.flag(Flag::Carry)
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A:{:02X} F:{:02X} B:{:02X} C:{:02X} D:{:02X} E:{:02X} H:{:02X} L:{:02X} \
             SP:{:04X} PC:{:04X} [Z:{} N:{} H:{} C:{}]",
            self.a(),
            self.f(),
            self.bc.hi(),
            self.bc.lo(),
            self.de.hi(),
            self.de.lo(),
            self.hl.hi(),
            self.hl.lo(),
            self.sp.value(),
            self.pc,
            self.zero() as u8,
            self.subtract() as u8,
            self.half_carry() as u8,
            self.carry() as u8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_halves() {
        let mut reg = Register::new(0x1234);
        assert_eq!(reg.hi(), 0x12);
        assert_eq!(reg.lo(), 0x34);

        reg.set_hi(0xAB);
        assert_eq!(reg.value(), 0xAB34);
        reg.set_lo(0xCD);
        assert_eq!(reg.value(), 0xABCD);
    }

    #[test]
    fn test_flag_register_low_nibble_always_zero() {
        let mut regs = Registers::new();
        regs.af.set(0xFFFF);
        assert_eq!(regs.f(), 0xF0);

        regs.af.set_lo(0x0F);
        assert_eq!(regs.f(), 0x00);

        for value in 0..=0xFFu8 {
            regs.af.set_lo(value);
            assert_eq!(regs.f() & 0x0F, 0);
        }

        regs.set_flag(Flag::Carry, true);
        assert_eq!(regs.f() & 0x0F, 0);
    }

    #[test]
    fn test_flag_bit_positions() {
        let mut regs = Registers::new();
        regs.set_flag(Flag::Zero, true);
        assert_eq!(regs.f(), 0x80);
        regs.set_flags(false, true, false, false);
        assert_eq!(regs.f(), 0x40);
        regs.set_flags(false, false, true, false);
        assert_eq!(regs.f(), 0x20);
        regs.set_flags(false, false, false, true);
        assert_eq!(regs.f(), 0x10);
        assert!(regs.carry());
        assert!(!regs.zero());
    }

    #[test]
    fn test_increment_wraps() {
        let mut reg = Register::new(0xFFFF);
        reg.increment();
        assert_eq!(reg.value(), 0);
        reg.decrement();
        assert_eq!(reg.value(), 0xFFFF);
    }
}
