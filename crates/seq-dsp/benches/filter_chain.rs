//! Filter chain benchmarks

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use seq_core::{ChainSettings, Slope};
use seq_dsp::{FilterChain, MonoChain, MonoProcessor};

fn full_settings() -> ChainSettings {
    ChainSettings {
        peak_gain_db: 6.0,
        low_cut_freq: 80.0,
        high_cut_freq: 12000.0,
        low_cut_slope: Slope::Db48,
        high_cut_slope: Slope::Db48,
        ..ChainSettings::default()
    }
}

fn bench_chain_design(c: &mut Criterion) {
    let settings = full_settings();
    let mut chain = FilterChain::default();

    c.bench_function("chain_design_48db", |b| {
        b.iter(|| {
            chain.update(black_box(&settings), 48000.0);
        })
    });
}

fn bench_chain_process(c: &mut Criterion) {
    let mut mono = MonoChain::new();
    mono.apply(&FilterChain::from_settings(&full_settings(), 48000.0));

    let mut buffer: Vec<f64> = (0..1024).map(|i| (i as f64 * 0.01).sin()).collect();

    c.bench_function("mono_chain_9_sections_1024", |b| {
        b.iter(|| {
            mono.process_block(black_box(&mut buffer));
        })
    });
}

criterion_group!(benches, bench_chain_design, bench_chain_process);
criterion_main!(benches);
