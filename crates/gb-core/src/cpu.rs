//! CPU module - LR35902 (DMG) implementation
//!
//! Fetches one instruction per step, resolves it through the normal or prefixed
//! page, executes it against a [`Bus`] and reports the base cost in clock units.

use thiserror::Error;

use crate::instruction::{
    decode, decode_prefixed, AluOp, Condition, Indirect, Instruction, ShiftOp, StackPair, R16, R8,
};
use crate::opcodes::{Opcode, OpcodeTable, CLOCKS_PER_MACHINE_CYCLE, PREFIX};
use crate::registers::{Flag, Registers};

/// Cost of one step while the CPU is halted
pub const HALTED_CYCLES: u32 = CLOCKS_PER_MACHINE_CYCLE;

/// Bus trait for memory and I/O access
pub trait Bus {
    /// Read a byte from the given address
    fn read(&mut self, address: u16) -> u8;
    /// Write a byte to the given address
    fn write(&mut self, address: u16, value: u8);
}

/// CPU error types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuError {
    /// Opcode with no handler in its page. PC has already moved past the opcode byte.
    #[error("unimplemented {table} opcode 0x{opcode:02X} at 0x{address:04X}")]
    Unimplemented {
        opcode: u8,
        table: OpcodeTable,
        address: u16,
    },
}

/// Result of a single CPU step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Executed {
    /// Address the instruction was fetched from
    pub address: u16,
    /// Opcode executed, `None` for a halted step
    pub opcode: Option<Opcode>,
    /// Elapsed clock units
    pub cycles: u32,
}

/// CPU emulator state
#[derive(Debug, Clone)]
pub struct Cpu {
    registers: Registers,
    /// Interrupt master enable
    ime: bool,
    halted: bool,
    /// Total cycles executed
    total_cycles: u64,
}

impl Cpu {
    /// Create a CPU in power-on state, PC at the boot overlay
    pub fn new() -> Self {
        Self::with_registers(Registers::new())
    }

    /// Create a CPU in the state the boot program leaves behind
    pub fn post_boot() -> Self {
        Self::with_registers(Registers::post_boot())
    }

    pub fn with_registers(registers: Registers) -> Self {
        Self {
            registers,
            ime: false,
            halted: false,
            total_cycles: 0,
        }
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn pc(&self) -> u16 {
        self.registers.pc
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.registers.pc = pc;
    }

    pub fn ime(&self) -> bool {
        self.ime
    }

    pub fn set_ime(&mut self, enabled: bool) {
        self.ime = enabled;
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Leave the halted state
    pub fn wake(&mut self) {
        self.halted = false;
    }

    /// Get total cycles executed
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Step one instruction
    pub fn step(&mut self, bus: &mut impl Bus) -> Result<Executed, CpuError> {
        let address = self.registers.pc;

        if self.halted {
            self.total_cycles += HALTED_CYCLES as u64;
            return Ok(Executed {
                address,
                opcode: None,
                cycles: HALTED_CYCLES,
            });
        }

        let byte = self.fetch8(bus);
        let (opcode, instruction) = if byte == PREFIX {
            let byte = self.fetch8(bus);
            (Opcode::prefixed(byte), decode_prefixed(byte))
        } else {
            match decode(byte) {
                Some(instruction) => (Opcode::normal(byte), instruction),
                None => {
                    return Err(CpuError::Unimplemented {
                        opcode: byte,
                        table: OpcodeTable::Normal,
                        address,
                    })
                }
            }
        };

        self.execute(instruction, bus);

        let cycles = opcode.clock_cycles();
        self.total_cycles += cycles as u64;
        Ok(Executed {
            address,
            opcode: Some(opcode),
            cycles,
        })
    }

    /// Execute a decoded instruction. Immediate operands are fetched from PC.
    pub fn execute(&mut self, instruction: Instruction, bus: &mut impl Bus) {
        use Instruction::*;

        match instruction {
            Nop => {}
            Stop => {
                // Padding byte
                self.fetch8(bus);
            }
            Halt => self.halted = true,
            DisableInterrupts => self.ime = false,
            EnableInterrupts => self.ime = true,

            LoadImmediate16(target) => {
                let value = self.fetch16(bus);
                self.set_r16(target, value);
            }
            StoreStackPointer => {
                let address = self.fetch16(bus);
                let sp = self.registers.sp.value();
                bus.write(address, sp as u8);
                bus.write(address.wrapping_add(1), (sp >> 8) as u8);
            }
            LoadStackPointerFromHl => {
                let hl = self.registers.hl.value();
                self.registers.sp.set(hl);
            }
            LoadHlFromStackOffset => {
                let value = self.stack_offset(bus);
                self.registers.hl.set(value);
            }

            LoadImmediate8(target) => {
                let value = self.fetch8(bus);
                self.write_r8(bus, target, value);
            }
            Load8(target, source) => {
                let value = self.read_r8(bus, source);
                self.write_r8(bus, target, value);
            }
            StoreAccumulator(target) => {
                let address = self.indirect_address(target);
                bus.write(address, self.registers.a());
            }
            LoadAccumulator(source) => {
                let address = self.indirect_address(source);
                let value = bus.read(address);
                self.registers.set_a(value);
            }
            StoreAccumulatorAbsolute => {
                let address = self.fetch16(bus);
                bus.write(address, self.registers.a());
            }
            LoadAccumulatorAbsolute => {
                let address = self.fetch16(bus);
                let value = bus.read(address);
                self.registers.set_a(value);
            }
            StoreHighImmediate => {
                let offset = self.fetch8(bus);
                bus.write(0xFF00 | offset as u16, self.registers.a());
            }
            LoadHighImmediate => {
                let offset = self.fetch8(bus);
                let value = bus.read(0xFF00 | offset as u16);
                self.registers.set_a(value);
            }
            StoreHighC => {
                let address = 0xFF00 | self.registers.bc.lo() as u16;
                bus.write(address, self.registers.a());
            }
            LoadHighC => {
                let address = 0xFF00 | self.registers.bc.lo() as u16;
                let value = bus.read(address);
                self.registers.set_a(value);
            }

            Increment8(target) => {
                let value = self.read_r8(bus, target);
                let result = value.wrapping_add(1);
                self.registers.set_flag(Flag::Zero, result == 0);
                self.registers.set_flag(Flag::Subtract, false);
                self.registers.set_flag(Flag::HalfCarry, value & 0x0F == 0x0F);
                self.write_r8(bus, target, result);
            }
            Decrement8(target) => {
                let value = self.read_r8(bus, target);
                let result = value.wrapping_sub(1);
                self.registers.set_flag(Flag::Zero, result == 0);
                self.registers.set_flag(Flag::Subtract, true);
                self.registers.set_flag(Flag::HalfCarry, value & 0x0F == 0);
                self.write_r8(bus, target, result);
            }
            Increment16(target) => {
                let value = self.r16(target).wrapping_add(1);
                self.set_r16(target, value);
            }
            Decrement16(target) => {
                let value = self.r16(target).wrapping_sub(1);
                self.set_r16(target, value);
            }
            AddHl(source) => {
                let hl = self.registers.hl.value();
                let value = self.r16(source);
                let (result, carry) = hl.overflowing_add(value);
                self.registers.set_flag(Flag::Subtract, false);
                self.registers
                    .set_flag(Flag::HalfCarry, (hl & 0x0FFF) + (value & 0x0FFF) > 0x0FFF);
                self.registers.set_flag(Flag::Carry, carry);
                self.registers.hl.set(result);
            }
            AddStackPointer => {
                let value = self.stack_offset(bus);
                self.registers.sp.set(value);
            }

            Alu(op, source) => {
                let value = self.read_r8(bus, source);
                self.alu(op, value);
            }
            AluImmediate(op) => {
                let value = self.fetch8(bus);
                self.alu(op, value);
            }

            Rlca => self.rotate_accumulator(ShiftOp::Rlc),
            Rrca => self.rotate_accumulator(ShiftOp::Rrc),
            Rla => self.rotate_accumulator(ShiftOp::Rl),
            Rra => self.rotate_accumulator(ShiftOp::Rr),
            Daa => self.daa(),
            Cpl => {
                let a = self.registers.a();
                self.registers.set_a(!a);
                self.registers.set_flag(Flag::Subtract, true);
                self.registers.set_flag(Flag::HalfCarry, true);
            }
            Scf => {
                self.registers.set_flag(Flag::Subtract, false);
                self.registers.set_flag(Flag::HalfCarry, false);
                self.registers.set_flag(Flag::Carry, true);
            }
            Ccf => {
                let carry = self.registers.carry();
                self.registers.set_flag(Flag::Subtract, false);
                self.registers.set_flag(Flag::HalfCarry, false);
                self.registers.set_flag(Flag::Carry, !carry);
            }

            JumpRelative(condition) => {
                // The offset is consumed whether or not the branch is taken
                let offset = self.fetch8(bus) as i8;
                if self.condition_met(condition) {
                    self.registers.pc = self.registers.pc.wrapping_add(offset as i16 as u16);
                }
            }
            Jump(condition) => {
                let target = self.fetch16(bus);
                if self.condition_met(condition) {
                    self.registers.pc = target;
                }
            }
            JumpHl => self.registers.pc = self.registers.hl.value(),
            Call(condition) => {
                let target = self.fetch16(bus);
                if self.condition_met(condition) {
                    let return_address = self.registers.pc;
                    self.push16(bus, return_address);
                    self.registers.pc = target;
                }
            }
            Return(condition) => {
                if self.condition_met(condition) {
                    self.registers.pc = self.pop16(bus);
                }
            }
            ReturnFromInterrupt => {
                self.registers.pc = self.pop16(bus);
                self.ime = true;
            }
            Restart(vector) => {
                let return_address = self.registers.pc;
                self.push16(bus, return_address);
                self.registers.pc = vector;
            }
            Push(pair) => {
                let value = self.stack_pair(pair);
                self.push16(bus, value);
            }
            Pop(pair) => {
                let value = self.pop16(bus);
                self.set_stack_pair(pair, value);
            }

            Shift(op, target) => {
                let value = self.read_r8(bus, target);
                let result = self.shift(op, value);
                self.write_r8(bus, target, result);
            }
            TestBit(bit, source) => {
                let value = self.read_r8(bus, source);
                self.registers.set_flag(Flag::Zero, value & (1 << bit) == 0);
                self.registers.set_flag(Flag::Subtract, false);
                self.registers.set_flag(Flag::HalfCarry, true);
            }
            ResetBit(bit, target) => {
                let value = self.read_r8(bus, target);
                self.write_r8(bus, target, value & !(1 << bit));
            }
            SetBit(bit, target) => {
                let value = self.read_r8(bus, target);
                self.write_r8(bus, target, value | (1 << bit));
            }
        }
    }

    /// Read an 8-bit operand; `[HL]` goes through the bus
    pub fn read_r8(&self, bus: &mut impl Bus, source: R8) -> u8 {
        match source {
            R8::B => self.registers.bc.hi(),
            R8::C => self.registers.bc.lo(),
            R8::D => self.registers.de.hi(),
            R8::E => self.registers.de.lo(),
            R8::H => self.registers.hl.hi(),
            R8::L => self.registers.hl.lo(),
            R8::HlIndirect => bus.read(self.registers.hl.value()),
            R8::A => self.registers.a(),
        }
    }

    /// Write an 8-bit operand; `[HL]` goes through the bus
    pub fn write_r8(&mut self, bus: &mut impl Bus, target: R8, value: u8) {
        match target {
            R8::B => self.registers.bc.set_hi(value),
            R8::C => self.registers.bc.set_lo(value),
            R8::D => self.registers.de.set_hi(value),
            R8::E => self.registers.de.set_lo(value),
            R8::H => self.registers.hl.set_hi(value),
            R8::L => self.registers.hl.set_lo(value),
            R8::HlIndirect => bus.write(self.registers.hl.value(), value),
            R8::A => self.registers.set_a(value),
        }
    }

    pub fn r16(&self, source: R16) -> u16 {
        match source {
            R16::BC => self.registers.bc.value(),
            R16::DE => self.registers.de.value(),
            R16::HL => self.registers.hl.value(),
            R16::SP => self.registers.sp.value(),
        }
    }

    pub fn set_r16(&mut self, target: R16, value: u16) {
        match target {
            R16::BC => self.registers.bc.set(value),
            R16::DE => self.registers.de.set(value),
            R16::HL => self.registers.hl.set(value),
            R16::SP => self.registers.sp.set(value),
        }
    }

    /// Push one byte: SP is decremented before the write
    pub fn push8(&mut self, bus: &mut impl Bus, value: u8) {
        self.registers.sp.decrement();
        bus.write(self.registers.sp.value(), value);
    }

    /// Pop one byte: SP is incremented after the read
    pub fn pop8(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.registers.sp.value());
        self.registers.sp.increment();
        value
    }

    /// Push high byte, then low byte
    pub fn push16(&mut self, bus: &mut impl Bus, value: u16) {
        self.push8(bus, (value >> 8) as u8);
        self.push8(bus, value as u8);
    }

    /// Pop low byte, then high byte
    pub fn pop16(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.pop8(bus) as u16;
        let hi = self.pop8(bus) as u16;
        (hi << 8) | lo
    }

    fn fetch8(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.registers.pc);
        self.registers.pc = self.registers.pc.wrapping_add(1);
        value
    }

    fn fetch16(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.fetch8(bus) as u16;
        let hi = self.fetch8(bus) as u16;
        (hi << 8) | lo
    }

    fn stack_pair(&self, pair: StackPair) -> u16 {
        match pair {
            StackPair::BC => self.registers.bc.value(),
            StackPair::DE => self.registers.de.value(),
            StackPair::HL => self.registers.hl.value(),
            StackPair::AF => self.registers.af.value(),
        }
    }

    fn set_stack_pair(&mut self, pair: StackPair, value: u16) {
        match pair {
            StackPair::BC => self.registers.bc.set(value),
            StackPair::DE => self.registers.de.set(value),
            StackPair::HL => self.registers.hl.set(value),
            StackPair::AF => self.registers.af.set(value),
        }
    }

    /// Resolve an indirect address, applying the HL post-increment/decrement
    fn indirect_address(&mut self, target: Indirect) -> u16 {
        match target {
            Indirect::BC => self.registers.bc.value(),
            Indirect::DE => self.registers.de.value(),
            Indirect::HlIncrement => {
                let address = self.registers.hl.value();
                self.registers.hl.increment();
                address
            }
            Indirect::HlDecrement => {
                let address = self.registers.hl.value();
                self.registers.hl.decrement();
                address
            }
        }
    }

    fn condition_met(&self, condition: Option<Condition>) -> bool {
        match condition {
            None => true,
            Some(Condition::NotZero) => !self.registers.zero(),
            Some(Condition::Zero) => self.registers.zero(),
            Some(Condition::NotCarry) => !self.registers.carry(),
            Some(Condition::Carry) => self.registers.carry(),
        }
    }

    /// SP + signed immediate, flags from the unsigned low-byte addition
    fn stack_offset(&mut self, bus: &mut impl Bus) -> u16 {
        let offset = self.fetch8(bus);
        let sp = self.registers.sp.value();
        let half_carry = (sp & 0x000F) + (offset as u16 & 0x000F) > 0x000F;
        let carry = (sp & 0x00FF) + offset as u16 > 0x00FF;
        self.registers.set_flags(false, false, half_carry, carry);
        sp.wrapping_add(offset as i8 as i16 as u16)
    }

    fn alu(&mut self, op: AluOp, value: u8) {
        let a = self.registers.a();
        let carry_in = self.registers.carry() as u8;

        match op {
            AluOp::Add | AluOp::Adc => {
                let carry_in = if op == AluOp::Adc { carry_in } else { 0 };
                let sum = a as u16 + value as u16 + carry_in as u16;
                let half_carry = (a & 0x0F) + (value & 0x0F) + carry_in > 0x0F;
                let result = sum as u8;
                self.registers.set_a(result);
                self.registers.set_flags(result == 0, false, half_carry, sum > 0xFF);
            }
            AluOp::Sub | AluOp::Sbc | AluOp::Cp => {
                let carry_in = if op == AluOp::Sbc { carry_in } else { 0 };
                let difference = a as i16 - value as i16 - carry_in as i16;
                let half_borrow =
                    ((a & 0x0F) as i16) - ((value & 0x0F) as i16) - (carry_in as i16) < 0;
                let result = difference as u8;
                if op != AluOp::Cp {
                    self.registers.set_a(result);
                }
                self.registers.set_flags(result == 0, true, half_borrow, difference < 0);
            }
            AluOp::And => {
                let result = a & value;
                self.registers.set_a(result);
                self.registers.set_flags(result == 0, false, true, false);
            }
            AluOp::Xor => {
                let result = a ^ value;
                self.registers.set_a(result);
                self.registers.set_flags(result == 0, false, false, false);
            }
            AluOp::Or => {
                let result = a | value;
                self.registers.set_a(result);
                self.registers.set_flags(result == 0, false, false, false);
            }
        }
    }

    /// Rotate/shift with Z, C from the result and N, H cleared
    fn shift(&mut self, op: ShiftOp, value: u8) -> u8 {
        let carry_in = self.registers.carry() as u8;
        let (result, carry) = match op {
            ShiftOp::Rlc => (value.rotate_left(1), value & 0x80 != 0),
            ShiftOp::Rrc => (value.rotate_right(1), value & 0x01 != 0),
            ShiftOp::Rl => ((value << 1) | carry_in, value & 0x80 != 0),
            ShiftOp::Rr => ((value >> 1) | (carry_in << 7), value & 0x01 != 0),
            ShiftOp::Sla => (value << 1, value & 0x80 != 0),
            ShiftOp::Sra => ((value >> 1) | (value & 0x80), value & 0x01 != 0),
            ShiftOp::Swap => (value.rotate_left(4), false),
            ShiftOp::Srl => (value >> 1, value & 0x01 != 0),
        };
        self.registers.set_flags(result == 0, false, false, carry);
        result
    }

    /// RLCA/RRCA/RLA/RRA: as the prefixed form on A, but Z is always cleared
    fn rotate_accumulator(&mut self, op: ShiftOp) {
        let a = self.registers.a();
        let result = self.shift(op, a);
        self.registers.set_a(result);
        self.registers.set_flag(Flag::Zero, false);
    }

    fn daa(&mut self) {
        let mut a = self.registers.a();
        let mut carry = self.registers.carry();

        if self.registers.subtract() {
            if carry {
                a = a.wrapping_sub(0x60);
            }
            if self.registers.half_carry() {
                a = a.wrapping_sub(0x06);
            }
        } else {
            if carry || a > 0x99 {
                a = a.wrapping_add(0x60);
                carry = true;
            }
            if self.registers.half_carry() || a & 0x0F > 0x09 {
                a = a.wrapping_add(0x06);
            }
        }

        self.registers.set_a(a);
        self.registers.set_flag(Flag::Zero, a == 0);
        self.registers.set_flag(Flag::HalfCarry, false);
        self.registers.set_flag(Flag::Carry, carry);
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
