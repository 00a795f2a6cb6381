use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::constants::PING_DECAY;
use crate::stats::LimiterStats;

/// Paces search and delete requests and keeps throttling and latency
/// statistics for one run. Counters are atomics so the fetcher and the
/// deleter can share the limiter by reference.
pub struct RateLimiter {
    search_delay: Duration,
    delete_delay: Duration,
    throttled_count: AtomicU64,
    throttled_total_us: AtomicU64,
    deleted_count: AtomicU64,
    ping_samples: AtomicU64,
    // f64 bit patterns
    last_ping_ms: AtomicU64,
    avg_ping_ms: AtomicU64,
}

impl RateLimiter {
    pub fn new(search_delay: Duration, delete_delay: Duration) -> Self {
        Self {
            search_delay,
            delete_delay,
            throttled_count: AtomicU64::new(0),
            throttled_total_us: AtomicU64::new(0),
            deleted_count: AtomicU64::new(0),
            ping_samples: AtomicU64::new(0),
            last_ping_ms: AtomicU64::new(0f64.to_bits()),
            avg_ping_ms: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub async fn wait_search(&self) {
        tokio::time::sleep(self.search_delay).await;
    }

    pub async fn wait_delete(&self) {
        tokio::time::sleep(self.delete_delay).await;
    }

    /// Record the round-trip time of the latest API call.
    pub fn track_ping(&self, sample_ms: f64) {
        self.last_ping_ms.store(sample_ms.to_bits(), Ordering::Relaxed);
        let first = self.ping_samples.fetch_add(1, Ordering::Relaxed) == 0;
        let _ = self
            .avg_ping_ms
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                let avg = if first {
                    sample_ms
                } else {
                    f64::from_bits(bits) * PING_DECAY + sample_ms * (1.0 - PING_DECAY)
                };
                Some(avg.to_bits())
            });
    }

    /// Count one throttled response. Waits are summed in microseconds so
    /// sub-millisecond `retry_after` values are not lost; the sum saturates.
    pub fn record_throttle(&self, retry_after: Duration) {
        self.throttled_count.fetch_add(1, Ordering::Relaxed);
        let micros = u64::try_from(retry_after.as_micros()).unwrap_or(u64::MAX);
        let _ = self
            .throttled_total_us
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |total| {
                Some(total.saturating_add(micros))
            });
    }

    pub fn record_deletion(&self) {
        self.deleted_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn throttled_count(&self) -> u64 {
        self.throttled_count.load(Ordering::Relaxed)
    }

    /// Total server-directed wait, rounded to the nearest millisecond.
    pub fn throttled_total_ms(&self) -> u64 {
        let micros = self.throttled_total_us.load(Ordering::Relaxed);
        micros / 1000 + u64::from(micros % 1000 >= 500)
    }

    pub fn deleted_count(&self) -> u64 {
        self.deleted_count.load(Ordering::Relaxed)
    }

    pub fn last_ping_ms(&self) -> f64 {
        f64::from_bits(self.last_ping_ms.load(Ordering::Relaxed))
    }

    pub fn avg_ping_ms(&self) -> f64 {
        f64::from_bits(self.avg_ping_ms.load(Ordering::Relaxed))
    }

    pub fn stats(&self) -> LimiterStats {
        LimiterStats {
            throttled_count: self.throttled_count(),
            throttled_total_ms: self.throttled_total_ms(),
            deleted_count: self.deleted_count(),
            last_ping_ms: self.last_ping_ms(),
            avg_ping_ms: self.avg_ping_ms(),
        }
    }
}
