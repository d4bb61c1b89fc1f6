//! Cache statistics
//!
//! Timings and counters emitted by the user caches. Sinks are
//! fire-and-forget: they never block and never fail the caller.

use metrics::{counter, histogram};
use std::time::Duration;

/// Metric name suffixes appended to an engine's prefix
pub mod names {
    pub const UPDATE: &str = "Update";
    pub const MISS: &str = "Miss";
}

pub trait Stats: Send + Sync {
    fn timing(&self, sample_rate: f32, name: &str, duration: Duration);

    fn counter(&self, sample_rate: f32, name: &str, delta: i64);
}

/// Forwards to the installed `metrics` recorder
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsStats;

impl MetricsStats {
    fn sampled(sample_rate: f32) -> bool {
        sample_rate >= 1.0 || rand::random::<f32>() < sample_rate
    }
}

impl Stats for MetricsStats {
    fn timing(&self, sample_rate: f32, name: &str, duration: Duration) {
        if Self::sampled(sample_rate) {
            histogram!(name.to_string()).record(duration.as_secs_f64());
        }
    }

    fn counter(&self, sample_rate: f32, name: &str, delta: i64) {
        // Counters only move forward
        if delta > 0 && Self::sampled(sample_rate) {
            counter!(name.to_string()).increment(delta as u64);
        }
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStats;

impl Stats for NoopStats {
    fn timing(&self, _sample_rate: f32, _name: &str, _duration: Duration) {}

    fn counter(&self, _sample_rate: f32, _name: &str, _delta: i64) {}
}
