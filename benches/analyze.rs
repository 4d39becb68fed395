//! Benchmarks for detection passes and candle synthesis.

use candlescan::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn generate_series(n: usize, seed: u64) -> CandleSeries {
  let synth = CandleSynthesizer::new(
    Timeframe::H1,
    SynthesisConfig {
      base_price: 30_000.0,
      volatility_fraction: 0.02,
      target_count: n,
      seed: Some(seed),
    },
  )
  .unwrap();
  synth.synthesize()
}

fn bench_single_detector(c: &mut Criterion) {
  let series = generate_series(1000, 1);
  let registry = DetectorRegistry::builder().register(DojiDetector::with_defaults()).build();

  c.bench_function("run_doji_1000_candles", |b| {
    b.iter(|| {
      let _ = black_box(registry.run_all(black_box(&series)));
    })
  });
}

fn bench_all_detectors(c: &mut Criterion) {
  let series = generate_series(1000, 2);
  let registry = DetectorRegistry::builder().with_all_defaults().build();

  c.bench_function("run_all_1000_candles", |b| {
    b.iter(|| {
      let _ = black_box(registry.run_all(black_box(&series)));
    })
  });
}

fn bench_scaling(c: &mut Criterion) {
  let registry = DetectorRegistry::builder().with_all_defaults().build();

  let mut group = c.benchmark_group("scaling");

  for size in [100, 500, 1000, 5000].iter() {
    let series = generate_series(*size, 3);

    group.bench_with_input(BenchmarkId::new("run_all", size), size, |b, _| {
      b.iter(|| {
        let _ = black_box(registry.run_all(black_box(&series)));
      })
    });
  }

  group.finish();
}

fn bench_parallel_analysis(c: &mut Criterion) {
  let registry = DetectorRegistry::builder().with_all_defaults().build();
  let instruments: Vec<(&str, CandleSeries)> = vec![
    ("BTC", generate_series(1000, 10)),
    ("ETH", generate_series(1000, 11)),
    ("SOL", generate_series(1000, 12)),
    ("XRP", generate_series(1000, 13)),
  ];

  c.bench_function("parallel_analysis_4_instruments", |b| {
    b.iter(|| {
      let _ = black_box(analyze_parallel(black_box(&registry), black_box(instruments.clone())));
    })
  });
}

fn bench_synthesis(c: &mut Criterion) {
  c.bench_function("synthesize_1000_candles", |b| {
    b.iter(|| {
      let _ = black_box(generate_series(1000, 42));
    })
  });
}

criterion_group!(
  benches,
  bench_single_detector,
  bench_all_detectors,
  bench_scaling,
  bench_parallel_analysis,
  bench_synthesis,
);

criterion_main!(benches);
