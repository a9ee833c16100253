//! Benchmarks for window and analysis operations
//!
//! Run with: cargo bench

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sensorvis_rs::trend::{moving_average, summarize};
use sensorvis_rs::types::{Sample, WindowDuration};
use sensorvis_rs::window::SlidingWindow;

fn samples_at_cadence(count: usize) -> Vec<Sample> {
    let base = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let phase = i as f64 * 0.05;
            Sample::genuine(
                base + chrono::Duration::seconds(i as i64),
                21.0 + 2.0 * phase.sin(),
                48.0 + 5.0 * phase.cos(),
            )
        })
        .collect()
}

fn bench_window_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_append");

    for size in [1_000, 10_000, 100_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let samples = samples_at_cadence(size);
            b.iter(|| {
                let mut window = SlidingWindow::new(WindowDuration::Day1);
                for sample in &samples {
                    window.append(black_box(sample.clone()));
                }
                window.len()
            });
        });
    }

    group.finish();
}

fn bench_window_append_and_evict(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_append_and_evict");
    group.throughput(Throughput::Elements(10_000));

    // A 1-minute window over 10k 1Hz samples evicts almost everything
    group.bench_function("steady_state_1min", |b| {
        let samples = samples_at_cadence(10_000);
        b.iter(|| {
            let mut window = SlidingWindow::new(WindowDuration::Min1);
            for sample in &samples {
                let now = sample.timestamp;
                window.append(black_box(sample.clone()));
                let horizon = window.horizon(now);
                window.evict_before(horizon);
            }
            window.len()
        });
    });

    group.finish();
}

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");

    for size in [300, 3_600, 86_400].iter() {
        let samples = samples_at_cadence(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &samples, |b, samples| {
            b.iter(|| summarize(black_box(samples)));
        });
    }

    group.finish();
}

fn bench_moving_average(c: &mut Criterion) {
    let mut group = c.benchmark_group("moving_average");

    for size in [300, 3_600, 86_400].iter() {
        let samples = samples_at_cadence(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &samples, |b, samples| {
            b.iter(|| moving_average(black_box(samples), 10));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_window_append,
    bench_window_append_and_evict,
    bench_summarize,
    bench_moving_average
);
criterion_main!(benches);
