//! Instruction decoding
//!
//! Maps opcode bytes to tagged instruction descriptors. Decoding is a pure function
//! of the opcode; operand fields packed into the opcode (register selectors,
//! conditions, bit indices) are lifted into explicit enums so the executor never
//! has to re-derive them.

/// 8-bit operand selector, encoded in 3 bits of the opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum R8 {
    B,
    C,
    D,
    E,
    H,
    L,
    /// Memory addressed by HL
    HlIndirect,
    A,
}

impl R8 {
    /// Decode from the low three bits of `bits`
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => R8::B,
            1 => R8::C,
            2 => R8::D,
            3 => R8::E,
            4 => R8::H,
            5 => R8::L,
            6 => R8::HlIndirect,
            _ => R8::A,
        }
    }
}

/// 16-bit register pair used by loads and 16-bit arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum R16 {
    BC,
    DE,
    HL,
    SP,
}

impl R16 {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => R16::BC,
            1 => R16::DE,
            2 => R16::HL,
            _ => R16::SP,
        }
    }
}

/// Register pair used by PUSH/POP (AF takes the place of SP)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackPair {
    BC,
    DE,
    HL,
    AF,
}

impl StackPair {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => StackPair::BC,
            1 => StackPair::DE,
            2 => StackPair::HL,
            _ => StackPair::AF,
        }
    }
}

/// Address source for `LD [r16],A` / `LD A,[r16]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indirect {
    BC,
    DE,
    /// HL, incremented after the access
    HlIncrement,
    /// HL, decremented after the access
    HlDecrement,
}

impl Indirect {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Indirect::BC,
            1 => Indirect::DE,
            2 => Indirect::HlIncrement,
            _ => Indirect::HlDecrement,
        }
    }
}

/// Branch condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    NotZero,
    Zero,
    NotCarry,
    Carry,
}

impl Condition {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Condition::NotZero,
            1 => Condition::Zero,
            2 => Condition::NotCarry,
            _ => Condition::Carry,
        }
    }
}

/// 8-bit accumulator ALU operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbc,
            4 => AluOp::And,
            5 => AluOp::Xor,
            6 => AluOp::Or,
            _ => AluOp::Cp,
        }
    }
}

/// Rotate/shift family of the prefixed page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    /// Rotate left circular
    Rlc,
    /// Rotate right circular
    Rrc,
    /// Rotate left through carry
    Rl,
    /// Rotate right through carry
    Rr,
    /// Shift left arithmetic
    Sla,
    /// Shift right arithmetic (bit 7 preserved)
    Sra,
    /// Swap nibbles
    Swap,
    /// Shift right logical
    Srl,
}

impl ShiftOp {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => ShiftOp::Rlc,
            1 => ShiftOp::Rrc,
            2 => ShiftOp::Rl,
            3 => ShiftOp::Rr,
            4 => ShiftOp::Sla,
            5 => ShiftOp::Sra,
            6 => ShiftOp::Swap,
            _ => ShiftOp::Srl,
        }
    }
}

/// Decoded instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Nop,
    Stop,
    Halt,
    /// DI
    DisableInterrupts,
    /// EI
    EnableInterrupts,

    /// LD r16,n16
    LoadImmediate16(R16),
    /// LD [a16],SP
    StoreStackPointer,
    /// LD SP,HL
    LoadStackPointerFromHl,
    /// LD HL,SP+e8
    LoadHlFromStackOffset,

    /// LD r8,n8
    LoadImmediate8(R8),
    /// LD r8,r8
    Load8(R8, R8),
    /// LD [r16],A
    StoreAccumulator(Indirect),
    /// LD A,[r16]
    LoadAccumulator(Indirect),
    /// LD [a16],A
    StoreAccumulatorAbsolute,
    /// LD A,[a16]
    LoadAccumulatorAbsolute,
    /// LDH [a8],A
    StoreHighImmediate,
    /// LDH A,[a8]
    LoadHighImmediate,
    /// LDH [C],A
    StoreHighC,
    /// LDH A,[C]
    LoadHighC,

    Increment8(R8),
    Decrement8(R8),
    Increment16(R16),
    Decrement16(R16),
    /// ADD HL,r16
    AddHl(R16),
    /// ADD SP,e8
    AddStackPointer,

    /// ALU op with a register/[HL] operand
    Alu(AluOp, R8),
    /// ALU op with an immediate operand
    AluImmediate(AluOp),

    Rlca,
    Rrca,
    Rla,
    Rra,
    Daa,
    Cpl,
    Scf,
    Ccf,

    /// JR [cc,]e8
    JumpRelative(Option<Condition>),
    /// JP [cc,]a16
    Jump(Option<Condition>),
    /// JP HL
    JumpHl,
    /// CALL [cc,]a16
    Call(Option<Condition>),
    /// RET [cc]
    Return(Option<Condition>),
    ReturnFromInterrupt,
    /// RST vector
    Restart(u16),
    Push(StackPair),
    Pop(StackPair),

    /// Prefixed rotate/shift
    Shift(ShiftOp, R8),
    /// BIT n,r8
    TestBit(u8, R8),
    /// RES n,r8
    ResetBit(u8, R8),
    /// SET n,r8
    SetBit(u8, R8),
}

/// Decode a normal-page opcode. Returns `None` for the unassigned opcodes and
/// for the prefix byte itself.
pub fn decode(opcode: u8) -> Option<Instruction> {
    use Instruction::*;

    // Field layout: xx yyy zzz, with yyy = pp q
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;
    let p = y >> 1;

    let instruction = match opcode {
        0x00 => Nop,
        0x08 => StoreStackPointer,
        0x10 => Stop,
        0x18 => JumpRelative(None),
        0x20 | 0x28 | 0x30 | 0x38 => JumpRelative(Some(Condition::from_bits(y))),

        0x01 | 0x11 | 0x21 | 0x31 => LoadImmediate16(R16::from_bits(p)),
        0x09 | 0x19 | 0x29 | 0x39 => AddHl(R16::from_bits(p)),
        0x02 | 0x12 | 0x22 | 0x32 => StoreAccumulator(Indirect::from_bits(p)),
        0x0A | 0x1A | 0x2A | 0x3A => LoadAccumulator(Indirect::from_bits(p)),
        0x03 | 0x13 | 0x23 | 0x33 => Increment16(R16::from_bits(p)),
        0x0B | 0x1B | 0x2B | 0x3B => Decrement16(R16::from_bits(p)),

        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => Increment8(R8::from_bits(y)),
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => Decrement8(R8::from_bits(y)),
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => LoadImmediate8(R8::from_bits(y)),

        0x07 => Rlca,
        0x0F => Rrca,
        0x17 => Rla,
        0x1F => Rra,
        0x27 => Daa,
        0x2F => Cpl,
        0x37 => Scf,
        0x3F => Ccf,

        // LD [HL],[HL] encodes HALT
        0x76 => Halt,
        0x40..=0x7F => Load8(R8::from_bits(y), R8::from_bits(z)),
        0x80..=0xBF => Alu(AluOp::from_bits(y), R8::from_bits(z)),

        0xC0 | 0xC8 | 0xD0 | 0xD8 => Return(Some(Condition::from_bits(y))),
        0xC9 => Return(None),
        0xD9 => ReturnFromInterrupt,
        0xC2 | 0xCA | 0xD2 | 0xDA => Jump(Some(Condition::from_bits(y))),
        0xC3 => Jump(None),
        0xE9 => JumpHl,
        0xC4 | 0xCC | 0xD4 | 0xDC => Call(Some(Condition::from_bits(y))),
        0xCD => Call(None),
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => Restart(y as u16 * 8),
        0xC1 | 0xD1 | 0xE1 | 0xF1 => Pop(StackPair::from_bits(p)),
        0xC5 | 0xD5 | 0xE5 | 0xF5 => Push(StackPair::from_bits(p)),
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => AluImmediate(AluOp::from_bits(y)),

        0xE0 => StoreHighImmediate,
        0xF0 => LoadHighImmediate,
        0xE2 => StoreHighC,
        0xF2 => LoadHighC,
        0xEA => StoreAccumulatorAbsolute,
        0xFA => LoadAccumulatorAbsolute,
        0xE8 => AddStackPointer,
        0xF8 => LoadHlFromStackOffset,
        0xF9 => LoadStackPointerFromHl,
        0xF3 => DisableInterrupts,
        0xFB => EnableInterrupts,

        // 0xCB is resolved by the fetch stage; the rest are holes in the map
        _ => return None,
    };

    Some(instruction)
}

/// Decode a prefixed-page opcode. Every byte is assigned.
pub fn decode_prefixed(opcode: u8) -> Instruction {
    let operand = R8::from_bits(opcode);
    let y = (opcode >> 3) & 0x07;

    match opcode >> 6 {
        0 => Instruction::Shift(ShiftOp::from_bits(y), operand),
        1 => Instruction::TestBit(y, operand),
        2 => Instruction::ResetBit(y, operand),
        _ => Instruction::SetBit(y, operand),
    }
}
