//! Core configuration — immutable for the lifetime of a session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::InstrumentError;
use crate::regime::RegimeConfig;
use crate::risk::RiskConfig;

/// Z-score signal parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Rolling window length N.
    pub window_size: usize,
    /// |Z| at or beyond which a position is opened against the move.
    pub z_enter: f64,
    /// |Z| at or inside which an open position is closed.
    pub z_exit: f64,
    /// Floor for the stdev divisor.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

fn default_epsilon() -> f64 {
    1e-9
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            window_size: 60,
            z_enter: 1.2,
            z_exit: 0.3,
            epsilon: default_epsilon(),
        }
    }
}

/// Stop-loss / take-profit placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitConfig {
    /// Stop distance in multiples of rolling volatility.
    pub stop_loss_k: f64,
    /// Target distance in multiples of the stop distance; `None` disables it.
    #[serde(default)]
    pub take_profit_k: Option<f64>,
    /// Stop distance floor as a fraction of price.
    #[serde(default)]
    pub min_stop_fraction: f64,
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            stop_loss_k: 2.0,
            take_profit_k: Some(1.5),
            min_stop_fraction: 0.001,
        }
    }
}

/// Everything the decision core needs, grouped by component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub regime: RegimeConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub exits: ExitConfig,
}

impl CoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.signal;
        if s.window_size < 2 {
            return Err(ConfigError::WindowTooSmall(s.window_size));
        }
        if !(s.z_enter.is_finite() && s.z_enter > 0.0) {
            return Err(ConfigError::InvalidParameter { name: "z_enter", value: s.z_enter });
        }
        if !(s.z_exit.is_finite() && s.z_exit >= 0.0 && s.z_exit < s.z_enter) {
            return Err(ConfigError::ExitBandNotInsideEntry {
                z_enter: s.z_enter,
                z_exit: s.z_exit,
            });
        }
        if !(s.epsilon.is_finite() && s.epsilon > 0.0) {
            return Err(ConfigError::InvalidParameter { name: "epsilon", value: s.epsilon });
        }

        let g = &self.regime;
        positive("max_volatility", g.max_volatility)?;
        positive("max_spread", g.max_spread)?;

        let r = &self.risk;
        if !(r.risk_pct > 0.0 && r.risk_pct < 1.0) {
            return Err(ConfigError::InvalidParameter { name: "risk_pct", value: r.risk_pct });
        }
        positive("max_daily_loss", r.max_daily_loss)?;
        if r.max_consecutive_losses == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_consecutive_losses",
                value: 0.0,
            });
        }
        if r.cooldown_secs < 0 {
            return Err(ConfigError::InvalidParameter {
                name: "cooldown_secs",
                value: r.cooldown_secs as f64,
            });
        }

        let e = &self.exits;
        positive("stop_loss_k", e.stop_loss_k)?;
        if let Some(tp) = e.take_profit_k {
            positive("take_profit_k", tp)?;
        }
        if !(e.min_stop_fraction.is_finite() && (0.0..1.0).contains(&e.min_stop_fraction)) {
            return Err(ConfigError::InvalidParameter {
                name: "min_stop_fraction",
                value: e.min_stop_fraction,
            });
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_nan() || value <= 0.0 {
        return Err(ConfigError::InvalidParameter { name, value });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("window_size must be >= 2, got {0}")]
    WindowTooSmall(usize),

    #[error("z_exit ({z_exit}) must be in [0, z_enter ({z_enter}))")]
    ExitBandNotInsideEntry { z_enter: f64, z_exit: f64 },

    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("invalid instrument: {0}")]
    Instrument(#[from] InstrumentError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(CoreConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_tiny_window() {
        let mut c = CoreConfig::default();
        c.signal.window_size = 1;
        assert_eq!(c.validate(), Err(ConfigError::WindowTooSmall(1)));
    }

    #[test]
    fn rejects_exit_band_wider_than_entry() {
        let mut c = CoreConfig::default();
        c.signal.z_exit = 2.0;
        c.signal.z_enter = 1.5;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::ExitBandNotInsideEntry { .. })
        ));
    }

    #[test]
    fn rejects_risk_pct_out_of_range() {
        let mut c = CoreConfig::default();
        c.risk.risk_pct = 1.5;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidParameter { name: "risk_pct", .. })
        ));
    }

    #[test]
    fn rejects_negative_cooldown() {
        let mut c = CoreConfig::default();
        c.risk.cooldown_secs = -1;
        assert!(c.validate().is_err());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let c: CoreConfig = serde_json::from_str(r#"{"signal":{"window_size":20,"z_enter":2.0,"z_exit":0.5}}"#).unwrap();
        assert_eq!(c.signal.window_size, 20);
        assert_eq!(c.signal.epsilon, 1e-9);
        assert_eq!(c.risk, RiskConfig::default());
        assert!(c.validate().is_ok());
    }
}
