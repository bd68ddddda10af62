//! Criterion benchmarks for the fan-out hot path

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use logger_facade::prelude::*;
use logger_facade::{LogSampler, SinkInstance};
use std::sync::Arc;
use std::time::Duration;

fn io_sink_logger(level: LogLevel) -> Logger {
    let logger = Logger::new();
    logger.add_sink("null", std::io::sink(), level, []);
    logger
}

// ============================================================================
// Fan-out
// ============================================================================

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");
    group.throughput(Throughput::Elements(1));

    let empty = Logger::new();
    group.bench_function("no_sinks", |b| {
        b.iter(|| empty.info(black_box("message"), []));
    });

    let one = io_sink_logger(LogLevel::Debug);
    group.bench_function("one_sink", |b| {
        b.iter(|| one.info(black_box("message"), [Field::int("n", 1)]));
    });

    let many = Logger::new();
    for i in 0..8 {
        many.add_sink(format!("null-{}", i), std::io::sink(), LogLevel::Debug, []);
    }
    group.bench_function("eight_sinks", |b| {
        b.iter(|| many.info(black_box("message"), [Field::int("n", 1)]));
    });

    let disabled = io_sink_logger(LogLevel::Debug);
    disabled.set_sink_enabled("null", false);
    group.bench_function("disabled_sink", |b| {
        b.iter(|| disabled.info(black_box("message"), []));
    });

    group.finish();
}

// ============================================================================
// Level filtering
// ============================================================================

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");

    let logger = io_sink_logger(LogLevel::Error);
    group.bench_function("filtered_out", |b| {
        b.iter(|| logger.debug(black_box("dropped"), []));
    });

    group.bench_function("is_level_enabled", |b| {
        b.iter(|| black_box(logger.is_level_enabled(black_box(LogLevel::Info))));
    });

    group.finish();
}

// ============================================================================
// Context loggers
// ============================================================================

fn bench_context(c: &mut Criterion) {
    let mut group = c.benchmark_group("context");

    let logger = Arc::new(io_sink_logger(LogLevel::Debug));
    let ctx = Context::background().with_logger(logger).with_fields([
        Field::string("request_id", "r-1"),
        Field::string("user", "ada"),
        Field::int("attempt", 1),
    ]);

    group.bench_function("with_fields_merge", |b| {
        b.iter(|| black_box(ctx.with_fields([Field::string("user", "bob"), Field::bool("new", true)])));
    });

    let log = ctx.must_context_logger();
    group.bench_function("context_logger_info", |b| {
        b.iter(|| log.info(black_box("handled"), [Field::int("status", 200)]));
    });

    let (cancelled, cancel) = ctx.with_cancel();
    cancel.cancel();
    group.bench_function("ignore_cancel_when_done", |b| {
        b.iter(|| log.error_ignore_cancel(&cancelled, black_box("suppressed"), []));
    });

    group.finish();
}

// ============================================================================
// Sampling
// ============================================================================

fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampling");

    let sampler = LogSampler::new(SamplingOptions {
        tick: Duration::from_secs(1),
        first: 100,
        thereafter: 100,
    });
    group.bench_function("sampler_direct", |b| {
        b.iter(|| black_box(sampler.should_sample(LogLevel::Info, black_box("repeated"))));
    });

    let sink = SinkInstance::new(
        "sampled",
        Box::new(JsonAppender::new(std::io::sink())),
        LogLevel::Debug,
        true,
    )
    .with_sampling(Some(SamplingOptions::default()));
    let entry = LogEntry::new(LogLevel::Info, "repeated", Vec::new());
    group.bench_function("sampled_sink_write", |b| {
        b.iter(|| black_box(sink.write(black_box(&entry))));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_fan_out,
    bench_level_filtering,
    bench_context,
    bench_sampling
);
criterion_main!(benches);
