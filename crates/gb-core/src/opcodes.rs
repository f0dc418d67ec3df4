//! Opcode tables
//!
//! Mnemonic and machine-cycle tables for the normal and 0xCB-prefixed instruction
//! pages. Both pages have 256 entries indexed by opcode byte. Mnemonics use
//! placeholder operands that a disassembler substitutes with the bytes that follow:
//! `n8`/`n16` immediates, `a8` high-RAM offsets, `a16` absolute addresses and `e8`
//! signed relative offsets.

use std::fmt;

/// Lead-in byte selecting the prefixed page
pub const PREFIX: u8 = 0xCB;

/// Clock units per machine cycle
pub const CLOCKS_PER_MACHINE_CYCLE: u32 = 4;

/// Which of the two opcode pages an opcode belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeTable {
    Normal,
    Prefixed,
}

impl fmt::Display for OpcodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpcodeTable::Normal => write!(f, "normal"),
            OpcodeTable::Prefixed => write!(f, "prefixed"),
        }
    }
}

/// A resolved opcode: the byte plus the page it was looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode {
    pub byte: u8,
    pub table: OpcodeTable,
}

impl Opcode {
    pub const fn normal(byte: u8) -> Self {
        Self {
            byte,
            table: OpcodeTable::Normal,
        }
    }

    pub const fn prefixed(byte: u8) -> Self {
        Self {
            byte,
            table: OpcodeTable::Prefixed,
        }
    }

    /// Mnemonic with placeholder operands
    pub fn mnemonic(&self) -> &'static str {
        match self.table {
            OpcodeTable::Normal => MNEMONICS[self.byte as usize],
            OpcodeTable::Prefixed => PREFIXED_MNEMONICS[self.byte as usize],
        }
    }

    /// Base cost in machine cycles (branch not taken)
    pub fn machine_cycles(&self) -> u8 {
        match self.table {
            OpcodeTable::Normal => CYCLES[self.byte as usize],
            OpcodeTable::Prefixed => PREFIXED_CYCLES[self.byte as usize],
        }
    }

    /// Base cost in clock units
    pub fn clock_cycles(&self) -> u32 {
        self.machine_cycles() as u32 * CLOCKS_PER_MACHINE_CYCLE
    }

    /// Encoded length in bytes, including the prefix byte for the prefixed page
    pub fn length(&self) -> u16 {
        match self.table {
            OpcodeTable::Prefixed => 2,
            OpcodeTable::Normal => operand_length(self.mnemonic()) + 1,
        }
    }
}

/// Number of operand bytes implied by a mnemonic's placeholders
pub fn operand_length(mnemonic: &str) -> u16 {
    if mnemonic.contains("n16") || mnemonic.contains("a16") {
        2
    } else if mnemonic.contains("n8") || mnemonic.contains("a8") || mnemonic.contains("e8") {
        1
    } else {
        0
    }
}

/// Machine cycles per normal opcode. Unassigned opcodes and the prefix byte cost 0;
/// the prefixed page carries the full cost of CB instructions.
pub static CYCLES: [u8; 256] = [
//  0  1  2  3  4  5  6  7  8  9  A  B  C  D  E  F
    1, 3, 2, 2, 1, 1, 2, 1, 5, 2, 2, 2, 1, 1, 2, 1, // 0
    1, 3, 2, 2, 1, 1, 2, 1, 3, 2, 2, 2, 1, 1, 2, 1, // 1
    2, 3, 2, 2, 1, 1, 2, 1, 2, 2, 2, 2, 1, 1, 2, 1, // 2
    2, 3, 2, 2, 3, 3, 3, 1, 2, 2, 2, 2, 1, 1, 2, 1, // 3
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 4
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 5
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 6
    2, 2, 2, 2, 2, 2, 1, 2, 1, 1, 1, 1, 1, 1, 2, 1, // 7
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 8
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 9
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // A
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // B
    2, 3, 3, 4, 3, 4, 2, 4, 2, 4, 3, 0, 3, 6, 2, 4, // C
    2, 3, 3, 0, 3, 4, 2, 4, 2, 4, 3, 0, 3, 0, 2, 4, // D
    3, 3, 2, 0, 0, 4, 2, 4, 4, 1, 4, 0, 0, 0, 2, 4, // E
    3, 3, 2, 1, 0, 4, 2, 4, 3, 2, 4, 1, 0, 0, 2, 4, // F
];

/// Machine cycles per prefixed opcode, prefix fetch included
pub static PREFIXED_CYCLES: [u8; 256] = [
//  0  1  2  3  4  5  6  7  8  9  A  B  C  D  E  F
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // 0
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // 1
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // 2
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // 3
    2, 2, 2, 2, 2, 2, 3, 2, 2, 2, 2, 2, 2, 2, 3, 2, // 4
    2, 2, 2, 2, 2, 2, 3, 2, 2, 2, 2, 2, 2, 2, 3, 2, // 5
    2, 2, 2, 2, 2, 2, 3, 2, 2, 2, 2, 2, 2, 2, 3, 2, // 6
    2, 2, 2, 2, 2, 2, 3, 2, 2, 2, 2, 2, 2, 2, 3, 2, // 7
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // 8
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // 9
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // A
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // B
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // C
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // D
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // E
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // F
];

pub static MNEMONICS: [&str; 256] = [
    // 0x00
    "NOP", "LD BC,n16", "LD [BC],A", "INC BC",
    "INC B", "DEC B", "LD B,n8", "RLCA",
    "LD [a16],SP", "ADD HL,BC", "LD A,[BC]", "DEC BC",
    "INC C", "DEC C", "LD C,n8", "RRCA",
    // 0x10
    "STOP n8", "LD DE,n16", "LD [DE],A", "INC DE",
    "INC D", "DEC D", "LD D,n8", "RLA",
    "JR e8", "ADD HL,DE", "LD A,[DE]", "DEC DE",
    "INC E", "DEC E", "LD E,n8", "RRA",
    // 0x20
    "JR NZ,e8", "LD HL,n16", "LD [HL+],A", "INC HL",
    "INC H", "DEC H", "LD H,n8", "DAA",
    "JR Z,e8", "ADD HL,HL", "LD A,[HL+]", "DEC HL",
    "INC L", "DEC L", "LD L,n8", "CPL",
    // 0x30
    "JR NC,e8", "LD SP,n16", "LD [HL-],A", "INC SP",
    "INC [HL]", "DEC [HL]", "LD [HL],n8", "SCF",
    "JR C,e8", "ADD HL,SP", "LD A,[HL-]", "DEC SP",
    "INC A", "DEC A", "LD A,n8", "CCF",
    // 0x40
    "LD B,B", "LD B,C", "LD B,D", "LD B,E",
    "LD B,H", "LD B,L", "LD B,[HL]", "LD B,A",
    "LD C,B", "LD C,C", "LD C,D", "LD C,E",
    "LD C,H", "LD C,L", "LD C,[HL]", "LD C,A",
    // 0x50
    "LD D,B", "LD D,C", "LD D,D", "LD D,E",
    "LD D,H", "LD D,L", "LD D,[HL]", "LD D,A",
    "LD E,B", "LD E,C", "LD E,D", "LD E,E",
    "LD E,H", "LD E,L", "LD E,[HL]", "LD E,A",
    // 0x60
    "LD H,B", "LD H,C", "LD H,D", "LD H,E",
    "LD H,H", "LD H,L", "LD H,[HL]", "LD H,A",
    "LD L,B", "LD L,C", "LD L,D", "LD L,E",
    "LD L,H", "LD L,L", "LD L,[HL]", "LD L,A",
    // 0x70
    "LD [HL],B", "LD [HL],C", "LD [HL],D", "LD [HL],E",
    "LD [HL],H", "LD [HL],L", "HALT", "LD [HL],A",
    "LD A,B", "LD A,C", "LD A,D", "LD A,E",
    "LD A,H", "LD A,L", "LD A,[HL]", "LD A,A",
    // 0x80
    "ADD A,B", "ADD A,C", "ADD A,D", "ADD A,E",
    "ADD A,H", "ADD A,L", "ADD A,[HL]", "ADD A,A",
    "ADC A,B", "ADC A,C", "ADC A,D", "ADC A,E",
    "ADC A,H", "ADC A,L", "ADC A,[HL]", "ADC A,A",
    // 0x90
    "SUB B", "SUB C", "SUB D", "SUB E",
    "SUB H", "SUB L", "SUB [HL]", "SUB A",
    "SBC A,B", "SBC A,C", "SBC A,D", "SBC A,E",
    "SBC A,H", "SBC A,L", "SBC A,[HL]", "SBC A,A",
    // 0xA0
    "AND B", "AND C", "AND D", "AND E",
    "AND H", "AND L", "AND [HL]", "AND A",
    "XOR B", "XOR C", "XOR D", "XOR E",
    "XOR H", "XOR L", "XOR [HL]", "XOR A",
    // 0xB0
    "OR B", "OR C", "OR D", "OR E",
    "OR H", "OR L", "OR [HL]", "OR A",
    "CP B", "CP C", "CP D", "CP E",
    "CP H", "CP L", "CP [HL]", "CP A",
    // 0xC0
    "RET NZ", "POP BC", "JP NZ,a16", "JP a16",
    "CALL NZ,a16", "PUSH BC", "ADD A,n8", "RST $00",
    "RET Z", "RET", "JP Z,a16", "PREFIX",
    "CALL Z,a16", "CALL a16", "ADC A,n8", "RST $08",
    // 0xD0
    "RET NC", "POP DE", "JP NC,a16", "ILLEGAL_D3",
    "CALL NC,a16", "PUSH DE", "SUB n8", "RST $10",
    "RET C", "RETI", "JP C,a16", "ILLEGAL_DB",
    "CALL C,a16", "ILLEGAL_DD", "SBC A,n8", "RST $18",
    // 0xE0
    "LDH [a8],A", "POP HL", "LDH [C],A", "ILLEGAL_E3",
    "ILLEGAL_E4", "PUSH HL", "AND n8", "RST $20",
    "ADD SP,e8", "JP HL", "LD [a16],A", "ILLEGAL_EB",
    "ILLEGAL_EC", "ILLEGAL_ED", "XOR n8", "RST $28",
    // 0xF0
    "LDH A,[a8]", "POP AF", "LDH A,[C]", "DI",
    "ILLEGAL_F4", "PUSH AF", "OR n8", "RST $30",
    "LD HL,SP+e8", "LD SP,HL", "LD A,[a16]", "EI",
    "ILLEGAL_FC", "ILLEGAL_FD", "CP n8", "RST $38",
];

pub static PREFIXED_MNEMONICS: [&str; 256] = [
    // 0x00
    "RLC B", "RLC C", "RLC D", "RLC E",
    "RLC H", "RLC L", "RLC [HL]", "RLC A",
    "RRC B", "RRC C", "RRC D", "RRC E",
    "RRC H", "RRC L", "RRC [HL]", "RRC A",
    // 0x10
    "RL B", "RL C", "RL D", "RL E",
    "RL H", "RL L", "RL [HL]", "RL A",
    "RR B", "RR C", "RR D", "RR E",
    "RR H", "RR L", "RR [HL]", "RR A",
    // 0x20
    "SLA B", "SLA C", "SLA D", "SLA E",
    "SLA H", "SLA L", "SLA [HL]", "SLA A",
    "SRA B", "SRA C", "SRA D", "SRA E",
    "SRA H", "SRA L", "SRA [HL]", "SRA A",
    // 0x30
    "SWAP B", "SWAP C", "SWAP D", "SWAP E",
    "SWAP H", "SWAP L", "SWAP [HL]", "SWAP A",
    "SRL B", "SRL C", "SRL D", "SRL E",
    "SRL H", "SRL L", "SRL [HL]", "SRL A",
    // 0x40
    "BIT 0,B", "BIT 0,C", "BIT 0,D", "BIT 0,E",
    "BIT 0,H", "BIT 0,L", "BIT 0,[HL]", "BIT 0,A",
    "BIT 1,B", "BIT 1,C", "BIT 1,D", "BIT 1,E",
    "BIT 1,H", "BIT 1,L", "BIT 1,[HL]", "BIT 1,A",
    // 0x50
    "BIT 2,B", "BIT 2,C", "BIT 2,D", "BIT 2,E",
    "BIT 2,H", "BIT 2,L", "BIT 2,[HL]", "BIT 2,A",
    "BIT 3,B", "BIT 3,C", "BIT 3,D", "BIT 3,E",
    "BIT 3,H", "BIT 3,L", "BIT 3,[HL]", "BIT 3,A",
    // 0x60
    "BIT 4,B", "BIT 4,C", "BIT 4,D", "BIT 4,E",
    "BIT 4,H", "BIT 4,L", "BIT 4,[HL]", "BIT 4,A",
    "BIT 5,B", "BIT 5,C", "BIT 5,D", "BIT 5,E",
    "BIT 5,H", "BIT 5,L", "BIT 5,[HL]", "BIT 5,A",
    // 0x70
    "BIT 6,B", "BIT 6,C", "BIT 6,D", "BIT 6,E",
    "BIT 6,H", "BIT 6,L", "BIT 6,[HL]", "BIT 6,A",
    "BIT 7,B", "BIT 7,C", "BIT 7,D", "BIT 7,E",
    "BIT 7,H", "BIT 7,L", "BIT 7,[HL]", "BIT 7,A",
    // 0x80
    "RES 0,B", "RES 0,C", "RES 0,D", "RES 0,E",
    "RES 0,H", "RES 0,L", "RES 0,[HL]", "RES 0,A",
    "RES 1,B", "RES 1,C", "RES 1,D", "RES 1,E",
    "RES 1,H", "RES 1,L", "RES 1,[HL]", "RES 1,A",
    // 0x90
    "RES 2,B", "RES 2,C", "RES 2,D", "RES 2,E",
    "RES 2,H", "RES 2,L", "RES 2,[HL]", "RES 2,A",
    "RES 3,B", "RES 3,C", "RES 3,D", "RES 3,E",
    "RES 3,H", "RES 3,L", "RES 3,[HL]", "RES 3,A",
    // 0xA0
    "RES 4,B", "RES 4,C", "RES 4,D", "RES 4,E",
    "RES 4,H", "RES 4,L", "RES 4,[HL]", "RES 4,A",
    "RES 5,B", "RES 5,C", "RES 5,D", "RES 5,E",
    "RES 5,H", "RES 5,L", "RES 5,[HL]", "RES 5,A",
    // 0xB0
    "RES 6,B", "RES 6,C", "RES 6,D", "RES 6,E",
    "RES 6,H", "RES 6,L", "RES 6,[HL]", "RES 6,A",
    "RES 7,B", "RES 7,C", "RES 7,D", "RES 7,E",
    "RES 7,H", "RES 7,L", "RES 7,[HL]", "RES 7,A",
    // 0xC0
    "SET 0,B", "SET 0,C", "SET 0,D", "SET 0,E",
    "SET 0,H", "SET 0,L", "SET 0,[HL]", "SET 0,A",
    "SET 1,B", "SET 1,C", "SET 1,D", "SET 1,E",
    "SET 1,H", "SET 1,L", "SET 1,[HL]", "SET 1,A",
    // 0xD0
    "SET 2,B", "SET 2,C", "SET 2,D", "SET 2,E",
    "SET 2,H", "SET 2,L", "SET 2,[HL]", "SET 2,A",
    "SET 3,B", "SET 3,C", "SET 3,D", "SET 3,E",
    "SET 3,H", "SET 3,L", "SET 3,[HL]", "SET 3,A",
    // 0xE0
    "SET 4,B", "SET 4,C", "SET 4,D", "SET 4,E",
    "SET 4,H", "SET 4,L", "SET 4,[HL]", "SET 4,A",
    "SET 5,B", "SET 5,C", "SET 5,D", "SET 5,E",
    "SET 5,H", "SET 5,L", "SET 5,[HL]", "SET 5,A",
    // 0xF0
    "SET 6,B", "SET 6,C", "SET 6,D", "SET 6,E",
    "SET 6,H", "SET 6,L", "SET 6,[HL]", "SET 6,A",
    "SET 7,B", "SET 7,C", "SET 7,D", "SET 7,E",
    "SET 7,H", "SET 7,L", "SET 7,[HL]", "SET 7,A",
];
