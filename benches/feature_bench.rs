//! Performance benchmarks for window feature extraction
//!
//! Run with: cargo bench --bench feature_bench

use cognitive_state_core::dataset::{CognitiveState, StateDistribution, Window};
use cognitive_state_core::features::{extract_feature_matrix, extract_features, power_spectrum};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const SAMPLE_RATE: usize = 128;
const CHANNELS: usize = 4;

fn synth_channel(samples: usize, phase: f32) -> Vec<f32> {
    (0..samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * 10.0 * t + phase).sin()
                + 0.5 * (2.0 * std::f32::consts::PI * 19.0 * t + phase * 1.7).sin()
                + 0.25 * (2.0 * std::f32::consts::PI * 5.5 * t).sin()
        })
        .collect()
}

fn synth_window(samples: usize) -> Vec<Vec<f32>> {
    (0..CHANNELS)
        .map(|ch| synth_channel(samples, ch as f32 * 0.6))
        .collect()
}

/// Benchmark the per-window feature vector at different window lengths
fn bench_extract_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_features");

    for samples in [128_usize, 256, 512].iter() {
        let channels = synth_window(*samples);
        group.bench_with_input(BenchmarkId::from_parameter(samples), samples, |b, _| {
            b.iter(|| {
                black_box(extract_features(black_box(&channels), SAMPLE_RATE).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark the parallel batch path over one subject's worth of windows
fn bench_feature_matrix(c: &mut Criterion) {
    let windows: Vec<Window> = (0..60)
        .map(|i| Window {
            channels: synth_window(SAMPLE_RATE),
            label: CognitiveState::Calm,
            soft: StateDistribution::uniform(),
            subject: i % 4,
        })
        .collect();

    c.bench_function("extract_feature_matrix_60_windows", |b| {
        b.iter(|| {
            black_box(extract_feature_matrix(black_box(&windows), SAMPLE_RATE).unwrap());
        });
    });
}

/// Benchmark the FFT power spectrum alone
fn bench_power_spectrum(c: &mut Criterion) {
    let mut group = c.benchmark_group("power_spectrum");

    for samples in [128_usize, 256, 1024].iter() {
        let signal = synth_channel(*samples, 0.3);
        group.bench_with_input(BenchmarkId::from_parameter(samples), samples, |b, _| {
            b.iter(|| {
                black_box(power_spectrum(black_box(&signal)));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_extract_features,
    bench_feature_matrix,
    bench_power_spectrum
);
criterion_main!(benches);
