//! Risk-budget position sizing
//!
//! Size so that a stop-out loses exactly the risk budget.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::InstrumentSpec;

/// Why a size could not be produced. Blocks the entry; never fatal.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SizingError {
    #[error("stop distance must be positive, got {distance}")]
    InvalidStopDistance { distance: f64 },

    #[error("equity must be positive, got {equity}")]
    InvalidEquity { equity: f64 },

    #[error("tick economics must be positive (tick_value={tick_value}, tick_size={tick_size})")]
    InvalidTickEconomics { tick_value: f64, tick_size: f64 },

    #[error("computed size {size} is not tradable (minimum {min})")]
    InvalidSize { size: f64, min: f64 },
}

/// Unrounded size for a risk budget.
///
/// # Formula
/// ```text
/// risk_amount   = equity * risk_pct
/// loss_per_unit = stop_distance / tick_size * tick_value
/// size          = risk_amount / loss_per_unit
/// ```
///
/// # Example
/// - Equity 10,000, risk 1% → 100 at risk
/// - Stop 5.0 away, tick 0.1 worth 1.0 → 50 lost per unit
/// - Size: 100 / 50 = 2 units
pub fn risk_budget_size(
    equity: f64,
    risk_pct: f64,
    stop_distance: f64,
    tick_value: f64,
    tick_size: f64,
) -> Result<f64, SizingError> {
    if !stop_distance.is_finite() || stop_distance <= 0.0 {
        return Err(SizingError::InvalidStopDistance { distance: stop_distance });
    }
    if !equity.is_finite() || equity <= 0.0 {
        return Err(SizingError::InvalidEquity { equity });
    }
    if !(tick_value.is_finite() && tick_value > 0.0 && tick_size.is_finite() && tick_size > 0.0) {
        return Err(SizingError::InvalidTickEconomics { tick_value, tick_size });
    }

    let risk_amount = equity * risk_pct;
    let loss_per_unit = stop_distance / tick_size * tick_value;
    let size = risk_amount / loss_per_unit;

    if !size.is_finite() || size <= 0.0 {
        return Err(SizingError::InvalidSize { size, min: 0.0 });
    }
    Ok(size)
}

/// Risk-budget size rounded to the instrument's volume rules.
///
/// Sizes that floor below `volume_min` are refused rather than rounded up.
pub fn instrument_size(
    instrument: &InstrumentSpec,
    equity: f64,
    risk_pct: f64,
    stop_distance: f64,
    tick_value: f64,
    tick_size: f64,
) -> Result<f64, SizingError> {
    let raw = risk_budget_size(equity, risk_pct, stop_distance, tick_value, tick_size)?;
    let rounded = instrument.round_volume(raw);
    if rounded <= 0.0 || rounded < instrument.volume_min {
        return Err(SizingError::InvalidSize {
            size: rounded,
            min: instrument.volume_min,
        });
    }
    Ok(rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_example_sizes_two_units() {
        let size = risk_budget_size(10_000.0, 0.01, 5.0, 1.0, 0.1).unwrap();
        assert!((size - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_zero_stop_distance() {
        assert_eq!(
            risk_budget_size(10_000.0, 0.01, 0.0, 1.0, 0.1),
            Err(SizingError::InvalidStopDistance { distance: 0.0 })
        );
        assert!(risk_budget_size(10_000.0, 0.01, -1.0, 1.0, 0.1).is_err());
    }

    #[test]
    fn rejects_zero_equity() {
        assert!(matches!(
            risk_budget_size(0.0, 0.01, 5.0, 1.0, 0.1),
            Err(SizingError::InvalidEquity { .. })
        ));
    }

    #[test]
    fn rejects_zero_risk() {
        assert!(matches!(
            risk_budget_size(10_000.0, 0.0, 5.0, 1.0, 0.1),
            Err(SizingError::InvalidSize { .. })
        ));
    }

    #[test]
    fn instrument_rounding_floors() {
        let inst = InstrumentSpec::new("X", 0.01, 0.01, 100.0);
        // raw = 100 / 80 = 1.25
        let size = instrument_size(&inst, 10_000.0, 0.01, 8.0, 1.0, 0.1).unwrap();
        assert_eq!(size, 1.25);
        // raw = 100 / 30 = 3.333.. -> 3.33
        let size = instrument_size(&inst, 10_000.0, 0.01, 3.0, 1.0, 0.1).unwrap();
        assert_eq!(size, 3.33);
    }

    #[test]
    fn below_minimum_is_refused() {
        let inst = InstrumentSpec::new("X", 0.1, 0.5, 100.0);
        // raw = 1 / 50 = 0.02 -> floors to 0.0
        let err = instrument_size(&inst, 100.0, 0.01, 5.0, 1.0, 0.1).unwrap_err();
        assert!(matches!(err, SizingError::InvalidSize { min, .. } if min == 0.5));
    }

    #[test]
    fn sizing_error_serializes() {
        let json = serde_json::to_string(&SizingError::InvalidStopDistance { distance: 0.0 }).unwrap();
        assert!(json.contains("invalid_stop_distance"));
    }
}
