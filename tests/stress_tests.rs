//! Stress tests for concurrent configuration changes
//!
//! These tests verify:
//! - Concurrent `start` calls provision the built-in sinks exactly once
//! - Concurrent `add_sink` calls never lose a sink
//! - Toggling and re-leveling sinks while other threads log is safe
//! - Sampling bounds output under a flood of identical messages

use logger_facade::{
    with_sampling, Appender, Field, LogEntry, LogLevel, Logger, SamplingOptions,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

struct Counting(Arc<AtomicUsize>);

impl Appender for Counting {
    fn append(&mut self, _entry: &LogEntry) -> logger_facade::Result<()> {
        self.0.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn flush(&mut self) -> logger_facade::Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

#[test]
fn test_concurrent_start_provisions_once() {
    let logger = Arc::new(Logger::new());
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let logger = Arc::clone(&logger);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                logger.start([]);
                logger.config()
            })
        })
        .collect();

    let snapshots: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .collect();

    let config = logger.config();
    assert_eq!(config.len(), 3);
    // every thread ended up with the same console sink instance
    let console = config.sink("debug-console").expect("console sink");
    for snapshot in snapshots {
        assert!(Arc::ptr_eq(
            snapshot.sink("debug-console").expect("console sink"),
            console
        ));
    }
}

#[test]
fn test_concurrent_add_sink_loses_nothing() {
    let logger = Arc::new(Logger::new());
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let logger = Arc::clone(&logger);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..25 {
                    logger.add_sink(format!("sink-{}-{}", t, i), std::io::sink(), LogLevel::Info, []);
                    // duplicates race with the originals and must be no-ops
                    logger.add_sink(format!("sink-{}-{}", t, i), std::io::sink(), LogLevel::Debug, []);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let config = logger.config();
    assert_eq!(config.len(), 200);
    assert!(config.sinks().all(|s| s.level() == LogLevel::Info));
}

#[test]
fn test_toggle_while_logging() {
    let logger = Arc::new(Logger::new());
    let count = Arc::new(AtomicUsize::new(0));
    logger.add_appender("count", Box::new(Counting(Arc::clone(&count))), LogLevel::Info, []);

    let stop = Arc::new(AtomicBool::new(false));
    let toggler = {
        let logger = Arc::clone(&logger);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut on = false;
            while !stop.load(Ordering::Relaxed) {
                logger.set_sink_enabled("count", on);
                logger.set_log_level("count", if on { LogLevel::Debug } else { LogLevel::Error });
                on = !on;
            }
            logger.set_sink_enabled("count", true);
        })
    };

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..2_000 {
                    logger.info("tick", [Field::int("thread", t), Field::int("i", i)]);
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().expect("Writer panicked");
    }
    stop.store(true, Ordering::Relaxed);
    toggler.join().expect("Toggler panicked");

    let written = count.load(Ordering::Relaxed);
    assert!(written <= 8_000);

    let sink = logger.sink("count").expect("count sink");
    assert!(sink.is_enabled());
    assert_eq!(sink.metrics().written_count() as usize, written);
}

#[test]
fn test_sampling_bounds_flood() {
    let logger = Arc::new(Logger::new());
    let count = Arc::new(AtomicUsize::new(0));
    let sampling = SamplingOptions {
        tick: Duration::from_secs(60),
        first: 10,
        thereafter: 100,
    };
    logger.add_appender(
        "sampled",
        Box::new(Counting(Arc::clone(&count))),
        LogLevel::Info,
        [with_sampling(sampling)],
    );

    // opens the tick window before the threads race on the counter
    logger.info("same message", []);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for _ in 0..250 {
                    logger.info("same message", []);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    // n = 1..=1001: first 10, then n = 110, 210, ..., 910
    assert_eq!(count.load(Ordering::Relaxed), 19);
}
