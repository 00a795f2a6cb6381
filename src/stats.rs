use serde::Serialize;

/// Point-in-time copy of a [`crate::RateLimiter`]'s counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LimiterStats {
    pub throttled_count: u64,
    pub throttled_total_ms: u64,
    pub deleted_count: u64,
    pub last_ping_ms: f64,
    pub avg_ping_ms: f64,
}
