//! Per-sink delivery counters
//!
//! Each [`SinkInstance`](super::sink::SinkInstance) keeps one of these so
//! callers can see what happened to records routed to it.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one sink
///
/// # Example
///
/// ```
/// use logger_facade::SinkMetrics;
///
/// let metrics = SinkMetrics::new();
/// metrics.record_written();
/// metrics.record_filtered();
///
/// assert_eq!(metrics.written_count(), 1);
/// assert_eq!(metrics.filtered_count(), 1);
/// ```
#[derive(Debug)]
pub struct SinkMetrics {
    /// Records the appender accepted
    written: AtomicU64,

    /// Records below the sink's minimum level
    filtered: AtomicU64,

    /// Records dropped by the sampler
    sampled_out: AtomicU64,

    /// Records the appender failed on (error or panic)
    failed: AtomicU64,
}

impl SinkMetrics {
    pub const fn new() -> Self {
        Self {
            written: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            sampled_out: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn written_count(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sampled_out_count(&self) -> u64 {
        self.sampled_out.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Every record that reached the sink, whatever its fate
    pub fn total_seen(&self) -> u64 {
        self.written_count() + self.filtered_count() + self.sampled_out_count() + self.failed_count()
    }

    #[inline]
    pub fn record_written(&self) {
        self.written.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_filtered(&self) {
        self.filtered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sampled_out(&self) {
        self.sampled_out.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.written.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.sampled_out.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
    }
}

impl Default for SinkMetrics {
    fn default() -> Self {
        Self::new()
    }
}
