//! Block throughput for the three filter algorithms.

use criterion::{criterion_group, criterion_main, Criterion};
use rb_dsp::{BlockIo, BlockParams, FilterBank, FilterType, BLOCK_SIZE, NUM_CHANNELS};

fn patterned_io() -> BlockIo {
    let mut io = BlockIo::new();
    for ch in 0..NUM_CHANNELS {
        for i in 0..BLOCK_SIZE {
            io.input[ch][i] = ((i * 53 + ch * 17) % 1200) as i32 - 600;
        }
    }
    io
}

fn bench_algorithms(c: &mut Criterion) {
    for (name, filter) in [
        ("twopass", FilterType::TwoPass),
        ("onepass", FilterType::OnePass),
        ("bpre", FilterType::Bpre),
    ] {
        let mut bank = FilterBank::with_default_catalog();
        bank.request_filter_type(filter);
        let mut io = patterned_io();
        let params = BlockParams::default();
        // Settle the pending type change outside the measurement.
        bank.process_block(&mut io, &params);

        c.bench_function(&format!("process_block/{}", name), |b| {
            b.iter(|| bank.process_block(&mut io, &params));
        });
    }
}

fn bench_morphing(c: &mut Criterion) {
    let mut bank = FilterBank::with_default_catalog();
    let mut io = patterned_io();
    let mut params = BlockParams::default();
    params.morph = [0.5; NUM_CHANNELS];
    params.morph_note = [9; NUM_CHANNELS];
    bank.process_block(&mut io, &params);

    c.bench_function("process_block/twopass_morphing", |b| {
        b.iter(|| bank.process_block(&mut io, &params));
    });
}

criterion_group!(benches, bench_algorithms, bench_morphing);
criterion_main!(benches);
