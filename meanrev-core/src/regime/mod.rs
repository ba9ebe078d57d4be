//! Regime gating — decides whether market conditions permit new entries.

pub mod filter;
pub mod session;

pub use filter::{evaluate, RegimeBlock, RegimeConfig, RegimeFilter, RegimeVerdict};
pub use session::{Blackout, TimeWindow};
