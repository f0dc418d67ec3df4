use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gb_core::cartridge::{Cartridge, ROM_BANK_SIZE};
use gb_core::opcodes::Opcode;
use gb_core::system::GameBoy;

/// Tight arithmetic loop: INC A ; ADD A,B ; XOR C ; JR -5
fn busy_loop() -> Cartridge {
    let mut rom = vec![0; 2 * ROM_BANK_SIZE];
    rom[0x100..0x105].copy_from_slice(&[0x3C, 0x80, 0xA9, 0x18, 0xFB]);
    Cartridge::from_rom(rom).expect("valid cartridge")
}

fn bench_step(c: &mut Criterion) {
    let mut gb = GameBoy::default();
    gb.insert_cartridge(busy_loop());
    gb.skip_boot();

    c.bench_function("step", |b| b.iter(|| black_box(gb.step().expect("step"))));
}

fn bench_frame(c: &mut Criterion) {
    let mut gb = GameBoy::default();
    gb.insert_cartridge(busy_loop());
    gb.skip_boot();

    c.bench_function("run_frame", |b| b.iter(|| black_box(gb.run_frame().expect("frame"))));
}

fn bench_mnemonic_lookup(c: &mut Criterion) {
    c.bench_function("mnemonic_lookup", |b| {
        b.iter(|| {
            (0..=0xFFu8)
                .map(|byte| Opcode::normal(black_box(byte)).mnemonic().len())
                .sum::<usize>()
        })
    });
}

criterion_group!(benches, bench_step, bench_frame, bench_mnemonic_lookup);
criterion_main!(benches);
