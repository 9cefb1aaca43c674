//! Criterion benchmarks for microstate-signal: GFP, peak extraction and correlation.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use microstate_signal::{ChannelMatrix, extract_gfp_peaks, global_field_power, paired_correlation};

fn make_recording(n_channels: usize, n_samples: usize) -> ChannelMatrix {
    let channels: Vec<Vec<f64>> = (0..n_channels)
        .map(|c| {
            (0..n_samples)
                .map(|t| (t as f64 * 0.05 + c as f64).sin() * (t as f64 * 0.013).cos())
                .collect()
        })
        .collect();
    ChannelMatrix::from_channels(channels).unwrap()
}

fn bench_global_field_power(c: &mut Criterion) {
    let data = make_recording(64, 10_000);
    c.bench_function("gfp_64ch_10000", |b| {
        b.iter(|| global_field_power(black_box(&data)));
    });
}

fn bench_extract_gfp_peaks(c: &mut Criterion) {
    let data = make_recording(64, 10_000);
    c.bench_function("gfp_peaks_64ch_10000_dist2", |b| {
        b.iter(|| extract_gfp_peaks(black_box(&data), 2).unwrap());
    });
}

fn bench_paired_correlation(c: &mut Criterion) {
    let a = make_recording(64, 10_000);
    let b_data = make_recording(64, 10_000);
    c.bench_function("paired_correlation_64ch_10000", |b| {
        b.iter(|| paired_correlation(black_box(&a), black_box(&b_data)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_global_field_power,
    bench_extract_gfp_peaks,
    bench_paired_correlation
);
criterion_main!(benches);
