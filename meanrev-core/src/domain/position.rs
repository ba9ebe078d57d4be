use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position side. `Flat` counts as a position with no exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Flat,
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short, 0 when flat.
    pub fn sign(self) -> f64 {
        match self {
            Side::Flat => 0.0,
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn is_flat(self) -> bool {
        self == Side::Flat
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Side::Flat => "flat",
            Side::Long => "long",
            Side::Short => "short",
        };
        f.write_str(s)
    }
}

/// The single position held for the instrument.
///
/// Invariant: `size > 0` and `entry_price` is set whenever `side != Flat`;
/// `size == 0` and every price field is `None` when flat. Only the
/// constructors below produce values, so the invariant holds by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub size: f64,
    pub entry_price: Option<f64>,
    pub stop_loss_price: Option<f64>,
    pub take_profit_price: Option<f64>,
    pub opened_at: Option<NaiveDateTime>,
}

impl Position {
    pub fn flat() -> Self {
        Self {
            side: Side::Flat,
            size: 0.0,
            entry_price: None,
            stop_loss_price: None,
            take_profit_price: None,
            opened_at: None,
        }
    }

    pub fn open(
        side: Side,
        entry_price: f64,
        size: f64,
        stop_loss_price: f64,
        take_profit_price: Option<f64>,
        opened_at: NaiveDateTime,
    ) -> Self {
        debug_assert!(!side.is_flat(), "open() requires a directional side");
        debug_assert!(size > 0.0, "open position must have positive size");
        Self {
            side,
            size,
            entry_price: Some(entry_price),
            stop_loss_price: Some(stop_loss_price),
            take_profit_price,
            opened_at: Some(opened_at),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.side.is_flat()
    }

    /// Floating P&L in account currency at `price`.
    pub fn unrealized_pnl(&self, price: f64, value_per_price: f64) -> f64 {
        match self.entry_price {
            Some(entry) => (price - entry) * self.side.sign() * self.size * value_per_price,
            None => 0.0,
        }
    }

    /// True when `price` is at or through the protective stop.
    pub fn stop_hit(&self, price: f64) -> bool {
        match (self.side, self.stop_loss_price) {
            (Side::Long, Some(stop)) => price <= stop,
            (Side::Short, Some(stop)) => price >= stop,
            _ => false,
        }
    }

    /// True when `price` is at or through the profit target.
    pub fn target_hit(&self, price: f64) -> bool {
        match (self.side, self.take_profit_price) {
            (Side::Long, Some(target)) => price >= target,
            (Side::Short, Some(target)) => price <= target,
            _ => false,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::flat()
    }
}
