//! CPU tests for the DMG emulator

use gb_core::cpu::{Bus, Cpu, CpuError};
use gb_core::mmu::Mmu;
use gb_core::opcodes::{Opcode, OpcodeTable, CYCLES, PREFIXED_CYCLES};
use gb_core::registers::Flag;

/// Work RAM address programs are loaded at
const ORIGIN: u16 = 0xC000;

fn load(program: &[u8]) -> (Cpu, Mmu) {
    let mut mmu = Mmu::new();
    for (i, &byte) in program.iter().enumerate() {
        mmu.write(ORIGIN + i as u16, byte);
    }
    let mut cpu = Cpu::new();
    cpu.set_pc(ORIGIN);
    cpu.registers_mut().sp.set(0xFFFE);
    (cpu, mmu)
}

#[test]
fn test_inc_dec_are_inverse() {
    for value in 0..=0xFFu8 {
        // INC C ; DEC C
        let (mut cpu, mut mmu) = load(&[0x0C, 0x0D]);
        cpu.registers_mut().bc.set_lo(value);

        cpu.step(&mut mmu).unwrap();
        let incremented = value.wrapping_add(1);
        assert_eq!(cpu.registers().bc.lo(), incremented);
        assert_eq!(cpu.registers().zero(), incremented == 0);
        assert_eq!(cpu.registers().half_carry(), value & 0x0F == 0x0F);

        cpu.step(&mut mmu).unwrap();
        assert_eq!(cpu.registers().bc.lo(), value);
        assert_eq!(cpu.registers().zero(), value == 0);
        assert_eq!(cpu.registers().half_carry(), incremented & 0x0F == 0x00);
        assert!(cpu.registers().subtract());
    }
}

#[test]
fn test_inc_dec_leave_carry() {
    let (mut cpu, mut mmu) = load(&[0x3C, 0x3D]);
    cpu.registers_mut().set_flag(Flag::Carry, true);
    cpu.step(&mut mmu).unwrap();
    cpu.step(&mut mmu).unwrap();
    assert!(cpu.registers().carry());
}

#[test]
fn test_push_pop_round_trip() {
    for value in [0x0000u16, 0x1234, 0xBEEF, 0xFFFF] {
        // PUSH DE ; POP HL
        let (mut cpu, mut mmu) = load(&[0xD5, 0xE1]);
        cpu.registers_mut().de.set(value);
        let sp = cpu.registers().sp.value();

        cpu.step(&mut mmu).unwrap();
        assert_eq!(cpu.registers().sp.value(), sp - 2);
        assert_eq!(mmu.read(sp - 1), (value >> 8) as u8);
        assert_eq!(mmu.read(sp - 2), value as u8);

        cpu.step(&mut mmu).unwrap();
        assert_eq!(cpu.registers().hl.value(), value);
        assert_eq!(cpu.registers().sp.value(), sp);
    }
}

#[test]
fn test_jr_target_arithmetic() {
    // JR -2 loops onto itself
    let (mut cpu, mut mmu) = load(&[0x18, 0xFE]);
    cpu.step(&mut mmu).unwrap();
    assert_eq!(cpu.pc(), ORIGIN);

    // JR +5
    let (mut cpu, mut mmu) = load(&[0x18, 0x05]);
    cpu.step(&mut mmu).unwrap();
    assert_eq!(cpu.pc(), ORIGIN + 2 + 5);
}

#[test]
fn test_jr_not_taken_consumes_offset() {
    // JR NZ,+16 with Z set
    let (mut cpu, mut mmu) = load(&[0x20, 0x10]);
    cpu.registers_mut().set_flag(Flag::Zero, true);
    let executed = cpu.step(&mut mmu).unwrap();
    assert_eq!(cpu.pc(), ORIGIN + 2);
    assert_eq!(executed.cycles, 8);

    // JR C,+16 with C set
    let (mut cpu, mut mmu) = load(&[0x38, 0x10]);
    cpu.registers_mut().set_flag(Flag::Carry, true);
    cpu.step(&mut mmu).unwrap();
    assert_eq!(cpu.pc(), ORIGIN + 2 + 0x10);
}

#[test]
fn test_jr_condition_gating() {
    // (opcode, flag tested, flag value, taken)
    let cases = [
        (0x20, Flag::Zero, false, true),   // JR NZ
        (0x20, Flag::Zero, true, false),
        (0x28, Flag::Zero, true, true),    // JR Z
        (0x28, Flag::Zero, false, false),
        (0x30, Flag::Carry, false, true),  // JR NC
        (0x30, Flag::Carry, true, false),
        (0x38, Flag::Carry, true, true),   // JR C
        (0x38, Flag::Carry, false, false),
    ];

    for (opcode, flag, value, taken) in cases {
        let (mut cpu, mut mmu) = load(&[opcode, 0x10]);
        cpu.registers_mut().set_flag(flag, value);
        let executed = cpu.step(&mut mmu).unwrap();
        let expected = if taken { ORIGIN + 2 + 0x10 } else { ORIGIN + 2 };
        assert_eq!(cpu.pc(), expected, "opcode 0x{:02X} with {:?}={}", opcode, flag, value);
        assert_eq!(executed.cycles, 8);
    }
}

#[test]
fn test_prefixed_shift_results_and_carry() {
    // (opcode on A, input, carry in, result, carry out)
    let cases = [
        (0x07, 0x80, false, 0x01, true),  // RLC A
        (0x0F, 0x01, false, 0x80, true),  // RRC A
        (0x0F, 0x02, true, 0x01, false),
        (0x17, 0x80, false, 0x00, true),  // RL A
        (0x17, 0x01, true, 0x03, false),
        (0x1F, 0x01, true, 0x80, true),   // RR A
        (0x1F, 0x02, false, 0x01, false),
        (0x27, 0x80, false, 0x00, true),  // SLA A
        (0x27, 0x41, true, 0x82, false),
        (0x2F, 0x81, false, 0xC0, true),  // SRA A keeps the sign bit
        (0x2F, 0x02, true, 0x01, false),
        (0x37, 0xF1, true, 0x1F, false),  // SWAP A
        (0x3F, 0x81, false, 0x40, true),  // SRL A
        (0x3F, 0x01, false, 0x00, true),
    ];

    for (opcode, input, carry_in, result, carry_out) in cases {
        let (mut cpu, mut mmu) = load(&[0xCB, opcode]);
        cpu.registers_mut().set_a(input);
        cpu.registers_mut().set_flag(Flag::Carry, carry_in);
        cpu.step(&mut mmu).unwrap();

        let registers = cpu.registers();
        let name = Opcode::prefixed(opcode).mnemonic();
        assert_eq!(registers.a(), result, "{} on 0x{:02X}", name, input);
        assert_eq!(registers.carry(), carry_out, "{} carry on 0x{:02X}", name, input);
        assert_eq!(registers.zero(), result == 0, "{} zero on 0x{:02X}", name, input);
        assert!(!registers.subtract());
        assert!(!registers.half_carry());
    }
}

#[test]
fn test_rlc_sets_carry_from_bit_seven() {
    // RLC B
    let (mut cpu, mut mmu) = load(&[0xCB, 0x00]);
    cpu.registers_mut().bc.set_hi(0b1000_0001);
    cpu.step(&mut mmu).unwrap();
    assert_eq!(cpu.registers().bc.hi(), 0b0000_0011);
    assert!(cpu.registers().carry());
    assert!(!cpu.registers().zero());
    assert!(!cpu.registers().subtract());
    assert!(!cpu.registers().half_carry());
}

#[test]
fn test_bit_seven() {
    // BIT 7,H
    let (mut cpu, mut mmu) = load(&[0xCB, 0x7C, 0xCB, 0x7C]);
    cpu.registers_mut().hl.set_hi(0x00);
    cpu.step(&mut mmu).unwrap();
    assert!(cpu.registers().zero());
    assert!(cpu.registers().half_carry());
    assert!(!cpu.registers().subtract());

    cpu.registers_mut().hl.set_hi(0x80);
    cpu.step(&mut mmu).unwrap();
    assert!(!cpu.registers().zero());
}

#[test]
fn test_xor_a_clears_accumulator() {
    let (mut cpu, mut mmu) = load(&[0xAF]);
    cpu.registers_mut().set_a(0x5C);
    cpu.registers_mut().set_flags(false, true, true, true);
    cpu.step(&mut mmu).unwrap();
    assert_eq!(cpu.registers().a(), 0);
    assert_eq!(cpu.registers().f(), 0x80);
}

#[test]
fn test_high_ram_window_loads() {
    // LD A,0x42 ; LDH [0x80],A ; LD C,0x81 ; LD A,0x24 ; LDH [C],A ; LDH A,[0x80]
    let (mut cpu, mut mmu) = load(&[
        0x3E, 0x42, 0xE0, 0x80, 0x0E, 0x81, 0x3E, 0x24, 0xE2, 0xF0, 0x80,
    ]);
    for _ in 0..6 {
        cpu.step(&mut mmu).unwrap();
    }
    assert_eq!(mmu.read(0xFF80), 0x42);
    assert_eq!(mmu.read(0xFF81), 0x24);
    assert_eq!(cpu.registers().a(), 0x42);
}

#[test]
fn test_every_prefixed_opcode_runs_at_table_cost() {
    for byte in 0..=0xFFu8 {
        let (mut cpu, mut mmu) = load(&[0xCB, byte]);
        cpu.registers_mut().hl.set(0xC100);
        let executed = cpu.step(&mut mmu).unwrap();
        assert_eq!(executed.opcode, Some(Opcode::prefixed(byte)));
        assert_eq!(executed.cycles, PREFIXED_CYCLES[byte as usize] as u32 * 4);
        assert_eq!(cpu.pc(), ORIGIN + 2);
    }
}

#[test]
fn test_every_unassigned_opcode_is_reported() {
    let unassigned: Vec<u8> = (0..=0xFFu8)
        .filter(|&b| CYCLES[b as usize] == 0 && b != 0xCB)
        .collect();
    assert_eq!(unassigned.len(), 11);

    for byte in unassigned {
        let (mut cpu, mut mmu) = load(&[byte]);
        let err = cpu.step(&mut mmu).unwrap_err();
        assert_eq!(
            err,
            CpuError::Unimplemented {
                opcode: byte,
                table: OpcodeTable::Normal,
                address: ORIGIN,
            }
        );
    }
}

#[test]
fn test_sub_borrow_and_sbc() {
    // SUB 0x01 with A=0 ; SBC A,0x00
    let (mut cpu, mut mmu) = load(&[0xD6, 0x01, 0xDE, 0x00]);
    cpu.registers_mut().set_a(0x00);
    cpu.step(&mut mmu).unwrap();
    assert_eq!(cpu.registers().a(), 0xFF);
    assert!(cpu.registers().carry());
    assert!(cpu.registers().half_carry());

    cpu.step(&mut mmu).unwrap();
    assert_eq!(cpu.registers().a(), 0xFE);
    assert!(!cpu.registers().carry());
}
