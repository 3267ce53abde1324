//! Benchmarks the preparation of detection functions: validation, sanitizing,
//! and smoothing. Useful to run this on a host platform to see the roughly
//! costs.
//!
//! To run bench these, run `$ cargo bench "detection function"`

use beat_tracker::layer_input_processing::smoothing::ZeroPhaseLowpass;
use beat_tracker::DetectionFunction;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn criterion_benchmark(c: &mut Criterion) {
    // One minute of audio at 44.1 kHz with a frame increment of 512 samples.
    let frame_count = 44100 * 60 / 512;
    let mut df = vec![0.0; frame_count];
    df.fill_with(rand::random::<f64>);
    let mut df_with_invalid = df.clone();
    for value in df_with_invalid.iter_mut().step_by(7) {
        *value = -*value;
    }

    assert_eq!(df.len(), frame_count);

    c.bench_function(
        &format!("{frame_count} frames: sanitize detection function"),
        |b| {
            b.iter(|| {
                let _res = black_box(DetectionFunction::new(black_box(&df_with_invalid)));
            })
        },
    );

    c.bench_function(
        &format!("{frame_count} frames: validate detection function (strict)"),
        |b| {
            b.iter(|| {
                let _res = black_box(DetectionFunction::try_new(black_box(&df)).unwrap());
            })
        },
    );

    c.bench_function(
        &format!("{frame_count} frames: smooth detection function (zero phase)"),
        |b| {
            let mut filter = ZeroPhaseLowpass::new();
            b.iter(|| {
                let mut values = df.clone();
                filter.process(black_box(&mut values));
                black_box(values);
            })
        },
    );
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
