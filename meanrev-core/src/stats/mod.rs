//! Streaming statistics — rolling mean, rolling stdev and the Z-score signal.
//!
//! The window holds the last N accepted prices. The Z-score is
//! `(price - mean) / max(stdev, epsilon)` and is `Unavailable` until N
//! samples have been accepted.

pub mod rolling;
pub mod tracker;

pub use rolling::{RollingStats, RollingWindow};
pub use tracker::{StatReading, StatTracker, ZScore};
