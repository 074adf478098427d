//! Criterion benchmarks for spectral_logger

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use spectral_logger::core::{ColorResolver, Formatter};
use spectral_logger::prelude::*;
use spectral_logger::sinks::MemorySink;

fn quiet_logger(buffered: bool) -> (Logger, MemorySink) {
    let stdout = MemorySink::new("stdout");
    let logger = Logger::builder()
        .normal_sink(stdout.clone())
        .elevated_sink(MemorySink::new("stderr"))
        .color_support(ColorSupport::TrueColor)
        .buffered(buffered)
        .build()
        .expect("Failed to build logger");
    (logger, stdout)
}

// ============================================================================
// Color Resolution Benchmarks
// ============================================================================

fn bench_color_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("color_resolution");
    group.throughput(Throughput::Elements(1));

    group.bench_function("cached_name", |b| {
        let mut colors = ColorResolver::with_support(ColorSupport::TrueColor);
        b.iter(|| black_box(colors.resolve(black_box("cyan"))));
    });

    group.bench_function("uncached_hex", |b| {
        b.iter_batched(
            || ColorResolver::with_support(ColorSupport::Ansi256),
            |mut colors| black_box(colors.resolve(black_box("#4a90d9"))),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("rgb_function", |b| {
        b.iter_batched(
            || ColorResolver::with_support(ColorSupport::TrueColor),
            |mut colors| black_box(colors.resolve(black_box("rgb(74, 144, 217)"))),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ============================================================================
// Formatting Benchmarks
// ============================================================================

fn bench_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatting");
    group.throughput(Throughput::Elements(1));

    let config = Config::default();
    let options = LogOptions::default();

    group.bench_function("full_line", |b| {
        let mut colors = ColorResolver::with_support(ColorSupport::TrueColor);
        b.iter(|| {
            let mut formatter = Formatter::new(&config, &mut colors);
            black_box(formatter.format(black_box("request served"), LogLevel::Info, &options))
        });
    });

    group.bench_function("no_color", |b| {
        let mut colors = ColorResolver::with_support(ColorSupport::None);
        b.iter(|| {
            let mut formatter = Formatter::new(&config, &mut colors);
            black_box(formatter.format(black_box("request served"), LogLevel::Info, &options))
        });
    });

    group.finish();
}

// ============================================================================
// Logging Throughput Benchmarks
// ============================================================================

fn bench_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("logging");
    group.throughput(Throughput::Elements(1));

    let (buffered, buffered_sink) = quiet_logger(true);
    group.bench_function("info_buffered", |b| {
        b.iter(|| buffered.info(black_box("Info message")));
    });
    buffered.flush_blocking().ok();
    buffered_sink.clear();

    let (direct, direct_sink) = quiet_logger(false);
    group.bench_function("info_unbuffered", |b| {
        b.iter(|| direct.info(black_box("Info message")));
    });
    direct.flush_blocking().ok();
    direct_sink.clear();

    let scoped = direct.child("bench");
    group.bench_function("info_scoped", |b| {
        b.iter(|| scoped.info(black_box("Info message")));
    });

    let value = serde_json::json!({"user": 42, "roles": ["admin", "dev"]});
    group.bench_function("info_json", |b| {
        b.iter(|| direct.info(black_box(value.clone())));
    });

    group.bench_function("error_dedup", |b| {
        b.iter(|| direct.error(ErrorReport::new("TypeError", black_box("x is undefined"))));
    });

    group.finish();
}

fn bench_macro_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("macro_logging");
    group.throughput(Throughput::Elements(1));

    let (logger, _sink) = quiet_logger(true);
    group.bench_function("info_formatted", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            spectral_logger::info!(logger, "request {} served in {}ms", black_box(i), 12);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_color_resolution,
    bench_formatting,
    bench_logging,
    bench_macro_logging,
);
criterion_main!(benches);
