//! Sliding-window mean / standard deviation with O(1) updates.
//!
//! Uses a windowed Welford update: the running mean and sum of squared
//! deviations (`m2`) are corrected for the evicted value on every push, so no
//! re-summation is needed. Floating-point drift is bounded two ways:
//! `m2` is clamped at zero, and the accumulators are recomputed exactly from
//! the ring buffer every `RESYNC_INTERVAL` evictions (amortized O(1)).
//!
//! Uses population variance (divide by N).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Evictions between exact recomputations of the accumulators.
const RESYNC_INTERVAL: usize = 1024;

/// Snapshot of the window statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingStats {
    pub window_size: usize,
    pub mean: f64,
    pub stdev: f64,
    pub sample_count: usize,
}

#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<f64>,
    mean: f64,
    m2: f64,
    evictions_since_resync: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "window capacity must be >= 1");
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
            mean: 0.0,
            m2: 0.0,
            evictions_since_resync: 0,
        }
    }

    /// Add a value, evicting the oldest once the window is full.
    ///
    /// Returns the evicted value, if any.
    pub fn push(&mut self, x: f64) -> Option<f64> {
        if self.values.len() < self.capacity {
            self.values.push_back(x);
            let n = self.values.len() as f64;
            let delta = x - self.mean;
            self.mean += delta / n;
            self.m2 += delta * (x - self.mean);
            self.m2 = self.m2.max(0.0);
            return None;
        }

        let old = self.values.pop_front()?;
        self.values.push_back(x);

        let n = self.capacity as f64;
        let old_mean = self.mean;
        self.mean = old_mean + (x - old) / n;
        self.m2 += (x - old) * (x - self.mean + old - old_mean);
        self.m2 = self.m2.max(0.0);

        self.evictions_since_resync += 1;
        if self.evictions_since_resync >= RESYNC_INTERVAL {
            self.resync();
        }
        Some(old)
    }

    /// Recompute mean and m2 exactly from the buffer (two-pass).
    fn resync(&mut self) {
        let n = self.values.len();
        if n == 0 {
            self.mean = 0.0;
            self.m2 = 0.0;
        } else {
            let mean = self.values.iter().sum::<f64>() / n as f64;
            self.m2 = self.values.iter().map(|v| (v - mean) * (v - mean)).sum();
            self.mean = mean;
        }
        self.evictions_since_resync = 0;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance over the values currently held; 0 when empty.
    pub fn variance(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            (self.m2 / self.values.len() as f64).max(0.0)
        }
    }

    pub fn stdev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn values(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    pub fn stats(&self) -> RollingStats {
        RollingStats {
            window_size: self.capacity,
            mean: self.mean,
            stdev: self.stdev(),
            sample_count: self.values.len(),
        }
    }
}
