//! Log sampling for high-volume scenarios
//!
//! Records are counted per `(level, message)` within a tick. The first `first`
//! records in a tick are kept, after that only every `thereafter`-th one.
//! A `thereafter` of zero drops everything past `first`.
//!
//! # Example
//!
//! ```
//! use logger_facade::{LogLevel, LogSampler, SamplingOptions};
//! use std::time::Duration;
//!
//! let sampler = LogSampler::new(SamplingOptions {
//!     tick: Duration::from_secs(1),
//!     first: 2,
//!     thereafter: 0,
//! });
//!
//! assert!(sampler.should_sample(LogLevel::Info, "retrying"));
//! assert!(sampler.should_sample(LogLevel::Info, "retrying"));
//! assert!(!sampler.should_sample(LogLevel::Info, "retrying"));
//! ```

use super::level::LogLevel;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const COUNTERS_PER_LEVEL: usize = 4096;

/// Sampling parameters, shared by every sampled sink of a logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingOptions {
    /// Length of one counting window
    #[serde(with = "duration_millis")]
    pub tick: Duration,
    /// Records kept unconditionally per key and tick
    pub first: u64,
    /// Keep every Mth record after `first`
    pub thereafter: u64,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            first: 100,
            thereafter: 100,
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[derive(Debug, Default)]
struct Counter {
    reset_at: AtomicU64,
    count: AtomicU64,
}

impl Counter {
    /// Increment, restarting the count if the tick has rolled over
    fn inc_check_reset(&self, now: u64, tick: u64) -> u64 {
        let reset_after = self.reset_at.load(Ordering::Acquire);
        if reset_after > now {
            return self.count.fetch_add(1, Ordering::AcqRel) + 1;
        }

        // Whoever wins the race restarts the window; losers just count.
        self.count.store(1, Ordering::Release);
        let new_reset_after = now.saturating_add(tick);
        if self
            .reset_at
            .compare_exchange(reset_after, new_reset_after, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return self.count.fetch_add(1, Ordering::AcqRel) + 1;
        }
        1
    }
}

/// Metrics for sampling observability
#[derive(Debug, Default)]
pub struct SamplerMetrics {
    sampled_count: AtomicU64,
    dropped_count: AtomicU64,
}

impl SamplerMetrics {
    #[inline]
    pub fn sampled_count(&self) -> u64 {
        self.sampled_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// Fraction of records kept; 1.0 before anything was seen
    pub fn effective_sample_rate(&self) -> f64 {
        let sampled = self.sampled_count() as f64;
        let total = sampled + self.dropped_count() as f64;
        if total == 0.0 {
            1.0
        } else {
            sampled / total
        }
    }
}

/// Tick-windowed sampler keyed by level and message
pub struct LogSampler {
    options: SamplingOptions,
    epoch: Instant,
    counters: Vec<Counter>,
    metrics: SamplerMetrics,
}

impl LogSampler {
    pub fn new(options: SamplingOptions) -> Self {
        let mut counters = Vec::with_capacity(LogLevel::ALL.len() * COUNTERS_PER_LEVEL);
        counters.resize_with(LogLevel::ALL.len() * COUNTERS_PER_LEVEL, Counter::default);
        Self {
            options,
            epoch: Instant::now(),
            counters,
            metrics: SamplerMetrics::default(),
        }
    }

    /// Whether the record should be written
    pub fn should_sample(&self, level: LogLevel, message: &str) -> bool {
        let slot = level as usize * COUNTERS_PER_LEVEL
            + (fnv32a(message) as usize % COUNTERS_PER_LEVEL);
        let now = saturating_nanos(self.epoch.elapsed());
        let tick = saturating_nanos(self.options.tick);
        let n = self.counters[slot].inc_check_reset(now, tick);

        let first = self.options.first;
        let thereafter = self.options.thereafter;
        let keep = n <= first || (thereafter != 0 && (n - first) % thereafter == 0);

        if keep {
            self.metrics.sampled_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.metrics.dropped_count.fetch_add(1, Ordering::Relaxed);
        }
        keep
    }

    pub fn options(&self) -> &SamplingOptions {
        &self.options
    }

    pub fn metrics(&self) -> &SamplerMetrics {
        &self.metrics
    }
}

impl std::fmt::Debug for LogSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSampler")
            .field("options", &self.options)
            .field("metrics", &self.metrics)
            .finish()
    }
}

fn saturating_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

fn fnv32a(s: &str) -> u32 {
    const OFFSET: u32 = 2_166_136_261;
    const PRIME: u32 = 16_777_619;
    s.bytes()
        .fold(OFFSET, |hash, b| (hash ^ u32::from(b)).wrapping_mul(PRIME))
}
