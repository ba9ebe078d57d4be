use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Static trading rules for the instrument: how size may be expressed.
///
/// Tick economics (tick value / tick size) are not stored here; they arrive
/// with every `PriceSample` because brokers may change them intraday.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentSpec {
    pub symbol: String,
    /// Smallest size increment (e.g. 0.01 lots).
    pub volume_step: f64,
    /// Smallest tradable size.
    pub volume_min: f64,
    /// Largest size accepted in one order.
    pub volume_max: f64,
}

impl InstrumentSpec {
    pub fn new(symbol: impl Into<String>, volume_step: f64, volume_min: f64, volume_max: f64) -> Self {
        Self {
            symbol: symbol.into(),
            volume_step,
            volume_min,
            volume_max,
        }
    }

    pub fn validate(&self) -> Result<(), InstrumentError> {
        if !self.volume_step.is_finite() || self.volume_step <= 0.0 {
            return Err(InstrumentError::InvalidVolumeStep(self.volume_step));
        }
        if !(self.volume_min > 0.0 && self.volume_max >= self.volume_min) {
            return Err(InstrumentError::InvalidVolumeBounds {
                min: self.volume_min,
                max: self.volume_max,
            });
        }
        Ok(())
    }

    /// Floor a raw size to the volume step and cap it at `volume_max`.
    ///
    /// Always rounds down: rounding up would risk more than the budget.
    /// The result is cleaned to 8 decimals so `2.0 / 0.01` style artefacts
    /// do not leak into order sizes.
    pub fn round_volume(&self, raw: f64) -> f64 {
        // Nudge so that 1.9999999999 steps counts as 2 steps.
        let steps = (raw / self.volume_step + 1e-9).floor();
        let floored = steps * self.volume_step;
        let capped = floored.min(self.volume_max);
        (capped * 1e8).round() / 1e8
    }
}

impl Default for InstrumentSpec {
    fn default() -> Self {
        Self::new("UNSPECIFIED", 0.01, 0.01, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstrumentError {
    #[error("volume_step must be positive, got {0}")]
    InvalidVolumeStep(f64),

    #[error("volume bounds must satisfy 0 < min <= max (min={min}, max={max})")]
    InvalidVolumeBounds { min: f64, max: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_to_volume_step() {
        let inst = InstrumentSpec::new("BTCUSD", 0.01, 0.01, 100.0);
        assert_eq!(inst.round_volume(1.239), 1.23);
        assert_eq!(inst.round_volume(2.0), 2.0);
    }

    #[test]
    fn caps_at_volume_max() {
        let inst = InstrumentSpec::new("BTCUSD", 0.01, 0.01, 5.0);
        assert_eq!(inst.round_volume(12.7), 5.0);
    }

    #[test]
    fn whole_lot_instrument() {
        let inst = InstrumentSpec::new("ES", 1.0, 1.0, 50.0);
        assert_eq!(inst.round_volume(3.99), 3.0);
        assert_eq!(inst.round_volume(0.7), 0.0);
    }

    #[test]
    fn validate_rejects_bad_step() {
        let inst = InstrumentSpec::new("X", 0.0, 0.01, 1.0);
        assert_eq!(inst.validate(), Err(InstrumentError::InvalidVolumeStep(0.0)));
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let inst = InstrumentSpec::new("X", 0.01, 2.0, 1.0);
        assert!(matches!(
            inst.validate(),
            Err(InstrumentError::InvalidVolumeBounds { .. })
        ));
    }

    #[test]
    fn default_is_valid() {
        assert!(InstrumentSpec::default().validate().is_ok());
    }
}
