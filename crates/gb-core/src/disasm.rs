//! Disassembly and trace formatting
//!
//! Walks a byte stream using the opcode length table and fills the mnemonic
//! placeholders with the operand bytes that follow each opcode.

use std::fmt;

use crate::opcodes::{Opcode, OpcodeTable, PREFIX};

const ADDRESS_SPACE: usize = 0x1_0000;

/// One decoded instruction from a byte stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassembledInstruction {
    pub address: u16,
    /// Encoded bytes, prefix included; shorter than the opcode length if the stream ended
    pub bytes: Vec<u8>,
    pub text: String,
}

impl fmt::Display for DisassembledInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self
            .bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{:04X}  {:<8}  {}", self.address, hex, self.text)
    }
}

/// Disassemble `bytes` as if loaded at `base`.
///
/// Stops at the end of the 64 KiB address space; bytes that would map past
/// $FFFF are not listed.
pub fn disassemble(bytes: &[u8], base: u16) -> Vec<DisassembledInstruction> {
    let window = ADDRESS_SPACE - base as usize;
    let bytes = &bytes[..bytes.len().min(window)];
    let mut instructions = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let opcode = match bytes[offset] {
            PREFIX if offset + 1 < bytes.len() => Opcode::prefixed(bytes[offset + 1]),
            byte => Opcode::normal(byte),
        };
        let length = opcode.length() as usize;
        let end = (offset + length).min(bytes.len());
        let encoded = &bytes[offset..end];
        let address = base.wrapping_add(offset as u16);

        let text = match opcode.table {
            OpcodeTable::Prefixed => opcode.mnemonic().to_string(),
            OpcodeTable::Normal => substitute(
                opcode.mnemonic(),
                &encoded[1..],
                address.wrapping_add(length as u16),
            ),
        };

        instructions.push(DisassembledInstruction {
            address,
            bytes: encoded.to_vec(),
            text,
        });
        offset += length;
    }

    instructions
}

/// Replace a mnemonic's placeholder with operand bytes.
///
/// `next_address` is the address after the instruction, used to resolve `e8`
/// jump targets. Placeholders are left as-is when operands are missing.
pub fn substitute(mnemonic: &str, operands: &[u8], next_address: u16) -> String {
    if let [lo, hi, ..] = *operands {
        let value = u16::from_le_bytes([lo, hi]);
        for placeholder in ["n16", "a16"] {
            if mnemonic.contains(placeholder) {
                return mnemonic.replacen(placeholder, &format!("${:04X}", value), 1);
            }
        }
    }

    if let [value, ..] = *operands {
        if mnemonic.contains("a8") {
            return mnemonic.replacen("a8", &format!("$FF{:02X}", value), 1);
        }
        if mnemonic.contains("n8") {
            return mnemonic.replacen("n8", &format!("${:02X}", value), 1);
        }
        if mnemonic.contains("e8") {
            let offset = value as i8;
            if mnemonic.starts_with("JR") {
                let target = next_address.wrapping_add(offset as i16 as u16);
                return mnemonic.replacen("e8", &format!("${:04X}", target), 1);
            }
            if offset < 0 {
                let text = format!("-${:02X}", offset.unsigned_abs());
                let placeholder = if mnemonic.contains("+e8") { "+e8" } else { "e8" };
                return mnemonic.replacen(placeholder, &text, 1);
            }
            return mnemonic.replacen("e8", &format!("${:02X}", offset), 1);
        }
    }

    mnemonic.to_string()
}

/// Per-instruction trace line: address, opcode byte, mnemonic
pub fn trace_line(address: u16, opcode: Opcode) -> String {
    format!("0x{:04X} 0x{:02X}   {}", address, opcode.byte, opcode.mnemonic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_immediates() {
        assert_eq!(substitute("LD SP,n16", &[0xFE, 0xFF], 0), "LD SP,$FFFE");
        assert_eq!(substitute("JP a16", &[0x50, 0x01], 0), "JP $0150");
        assert_eq!(substitute("CP n8", &[0x90], 0), "CP $90");
        assert_eq!(substitute("LDH [a8],A", &[0x40], 0), "LDH [$FF40],A");
    }

    #[test]
    fn test_substitute_relative() {
        assert_eq!(substitute("JR NZ,e8", &[0xFB], 0x000C), "JR NZ,$0007");
        assert_eq!(substitute("JR e8", &[0x02], 0x0102), "JR $0104");
        assert_eq!(substitute("ADD SP,e8", &[0xFE], 0), "ADD SP,-$02");
        assert_eq!(substitute("LD HL,SP+e8", &[0xFE], 0), "LD HL,SP-$02");
        assert_eq!(substitute("LD HL,SP+e8", &[0x05], 0), "LD HL,SP+$05");
    }

    #[test]
    fn test_missing_operands_keep_placeholder() {
        assert_eq!(substitute("JP a16", &[0x50], 0), "JP a16");
        assert_eq!(substitute("NOP", &[], 0), "NOP");
    }

    #[test]
    fn test_disassemble_stream() {
        // LD SP,$FFFE ; XOR A ; BIT 7,H ; JR NZ,-5
        let program = [0x31, 0xFE, 0xFF, 0xAF, 0xCB, 0x7C, 0x20, 0xFB];
        let listing = disassemble(&program, 0x0000);
        let texts: Vec<_> = listing.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, ["LD SP,$FFFE", "XOR A", "BIT 7,H", "JR NZ,$0003"]);
        assert_eq!(listing[2].address, 0x0004);
        assert_eq!(listing[2].bytes, vec![0xCB, 0x7C]);
        assert_eq!(listing[3].to_string(), "0006  20 FB     JR NZ,$0003");
    }

    #[test]
    fn test_trace_line_format() {
        assert_eq!(trace_line(0x0150, Opcode::normal(0xAF)), "0x0150 0xAF   XOR A");
        assert_eq!(trace_line(0x0150, Opcode::prefixed(0x7C)), "0x0150 0x7C   BIT 7,H");
    }

    #[test]
    fn test_listing_stops_at_top_of_address_space() {
        let listing = disassemble(&[0x00; 8], 0xFFFE);
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[1].address, 0xFFFF);

        let image = vec![0x00; 0x1_0000];
        let listing = disassemble(&image, 0x4000);
        assert_eq!(listing.len(), 0xC000);
        assert_eq!(listing.last().map(|i| i.address), Some(0xFFFF));
    }
}
