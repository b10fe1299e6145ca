//! In-process counters and a latency histogram for model calls.
//!
//! Observational only: nothing reads these to make decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Upper bounds (seconds) of the latency histogram buckets.
pub const LATENCY_BUCKETS: [f64; 10] = [0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, f64::INFINITY];

#[derive(Debug, Default)]
pub struct Metrics {
    requests_success: AtomicU64,
    requests_error: AtomicU64,
    /// Turns rejected before reaching the model (validation, throttling).
    rejected_total: AtomicU64,
    tokens_used_total: AtomicU64,
    latency_buckets: [AtomicU64; LATENCY_BUCKETS.len()],
    latency_sum_us: AtomicU64,
}

/// Point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub requests_success: u64,
    pub requests_error: u64,
    pub rejected_total: u64,
    pub tokens_used_total: u64,
    /// Per-bucket counts (not cumulative), aligned with [`LATENCY_BUCKETS`].
    pub latency_buckets: Vec<u64>,
    pub latency_sum_seconds: f64,
}

impl MetricsSnapshot {
    pub fn requests_total(&self) -> u64 {
        self.requests_success + self.requests_error
    }

    pub fn mean_latency_seconds(&self) -> f64 {
        match self.requests_total() {
            0 => 0.0,
            n => self.latency_sum_seconds / n as f64,
        }
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one model call and observe its latency.
    pub fn record_request(&self, success: bool, latency: Duration) {
        let counter = if success { &self.requests_success } else { &self.requests_error };
        counter.fetch_add(1, Ordering::Relaxed);

        let secs = latency.as_secs_f64();
        let idx = LATENCY_BUCKETS
            .iter()
            .position(|upper| secs <= *upper)
            .unwrap_or(LATENCY_BUCKETS.len() - 1);
        self.latency_buckets[idx].fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_tokens(&self, tokens: u64) {
        self.tokens_used_total.fetch_add(tokens, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_success: self.requests_success.load(Ordering::Relaxed),
            requests_error: self.requests_error.load(Ordering::Relaxed),
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
            tokens_used_total: self.tokens_used_total.load(Ordering::Relaxed),
            latency_buckets: self
                .latency_buckets
                .iter()
                .map(|b| b.load(Ordering::Relaxed))
                .collect(),
            latency_sum_seconds: self.latency_sum_us.load(Ordering::Relaxed) as f64 / 1_000_000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_status() {
        let m = Metrics::new();
        m.record_request(true, Duration::from_millis(50));
        m.record_request(true, Duration::from_millis(50));
        m.record_request(false, Duration::from_millis(50));
        let s = m.snapshot();
        assert_eq!(s.requests_success, 2);
        assert_eq!(s.requests_error, 1);
        assert_eq!(s.requests_total(), 3);
    }

    #[test]
    fn latency_lands_in_bucket() {
        let m = Metrics::new();
        m.record_request(true, Duration::from_millis(80));
        m.record_request(true, Duration::from_millis(300));
        m.record_request(true, Duration::from_secs(120));
        let s = m.snapshot();
        assert_eq!(s.latency_buckets[0], 1);
        assert_eq!(s.latency_buckets[2], 1);
        assert_eq!(s.latency_buckets[LATENCY_BUCKETS.len() - 1], 1);
        assert!((s.latency_sum_seconds - 120.38).abs() < 1e-6);
    }

    #[test]
    fn tokens_and_rejections_accumulate() {
        let m = Metrics::new();
        m.record_tokens(20);
        m.record_tokens(130);
        m.record_rejection();
        let s = m.snapshot();
        assert_eq!(s.tokens_used_total, 150);
        assert_eq!(s.rejected_total, 1);
    }

    #[test]
    fn mean_latency_of_empty_is_zero() {
        assert_eq!(Metrics::new().snapshot().mean_latency_seconds(), 0.0);
    }
}
