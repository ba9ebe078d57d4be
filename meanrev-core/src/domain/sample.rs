//! PriceSample — the fundamental market data unit fed into the core.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One closed bar (or tick) for the traded instrument.
///
/// Carries the instrument's tick economics alongside the price so that sizing
/// always uses point-in-time values rather than a cached copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub spread: f64,
    /// Monetary value of one tick move for one unit of size.
    pub tick_value: f64,
    /// Minimum price increment.
    pub tick_size: f64,
}

impl PriceSample {
    pub fn new(
        timestamp: NaiveDateTime,
        price: f64,
        spread: f64,
        tick_value: f64,
        tick_size: f64,
    ) -> Self {
        Self { timestamp, price, spread, tick_value, tick_size }
    }

    /// Field-level sanity check. Ordering is checked by the engine, which
    /// owns the last accepted timestamp.
    pub fn validate(&self) -> Result<(), SampleRejection> {
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(SampleRejection::InvalidPrice(self.price));
        }
        if !self.spread.is_finite() || self.spread <= 0.0 {
            return Err(SampleRejection::InvalidSpread(self.spread));
        }
        if !self.tick_value.is_finite()
            || self.tick_value <= 0.0
            || !self.tick_size.is_finite()
            || self.tick_size <= 0.0
        {
            return Err(SampleRejection::InvalidTickEconomics {
                tick_value: self.tick_value,
                tick_size: self.tick_size,
            });
        }
        Ok(())
    }

    /// Money gained or lost per one unit of price movement for one unit of size.
    pub fn value_per_price(&self) -> f64 {
        self.tick_value / self.tick_size
    }
}

/// Why a sample was refused. A rejected sample never mutates core state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleRejection {
    #[error("out-of-order sample: {received} is not after last accepted {last}")]
    OutOfOrder {
        last: NaiveDateTime,
        received: NaiveDateTime,
    },

    #[error("price must be positive and finite, got {0}")]
    InvalidPrice(f64),

    #[error("spread must be positive and finite, got {0}")]
    InvalidSpread(f64),

    #[error("tick economics must be positive and finite (tick_value={tick_value}, tick_size={tick_size})")]
    InvalidTickEconomics { tick_value: f64, tick_size: f64 },
}
