//! Entry planning for a flat position.

use crate::config::{ExitConfig, SignalConfig};
use crate::domain::{IntentReason, PriceSample, Side};
use crate::regime::RegimeVerdict;
use crate::risk::{RiskGovernor, RiskVerdict};
use crate::stats::StatReading;

/// A fully sized entry, ready to be emitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryPlan {
    pub side: Side,
    pub size: f64,
    pub stop_distance: f64,
    pub stop_loss_price: f64,
    pub take_profit_price: Option<f64>,
}

/// Side implied by the Z-score alone: fade the move.
pub fn signal_side(z: f64, z_enter: f64) -> Option<Side> {
    if z <= -z_enter {
        Some(Side::Long)
    } else if z >= z_enter {
        Some(Side::Short)
    } else {
        None
    }
}

/// Volatility-scaled stop distance, floored at a fraction of price.
pub fn stop_distance(volatility: f64, price: f64, exits: &ExitConfig) -> f64 {
    (exits.stop_loss_k * volatility).max(price * exits.min_stop_fraction)
}

/// Run the entry gates in order: signal, regime, risk, sizing.
///
/// Returns the reason for staying flat when any gate refuses.
#[allow(clippy::too_many_arguments)]
pub fn plan_entry(
    sample: &PriceSample,
    reading: &StatReading,
    regime: &RegimeVerdict,
    risk: &RiskVerdict,
    equity: f64,
    governor: &RiskGovernor,
    signal: &SignalConfig,
    exits: &ExitConfig,
) -> Result<EntryPlan, IntentReason> {
    let z = reading.zscore.value().ok_or(IntentReason::InsufficientData)?;
    let side = signal_side(z, signal.z_enter).ok_or(IntentReason::NoSignal)?;

    if let Some(block) = &regime.block {
        return Err(IntentReason::RegimeBlocked { block: block.clone() });
    }
    if let Some(block) = &risk.block {
        return Err(IntentReason::RiskBlocked { block: block.clone() });
    }

    let distance = stop_distance(reading.volatility, sample.price, exits);
    let size = governor
        .position_size(
            equity,
            governor.risk_pct(),
            distance,
            sample.tick_value,
            sample.tick_size,
        )
        .map_err(|error| IntentReason::SizingRejected { error })?;

    let dir = side.sign();
    Ok(EntryPlan {
        side,
        size,
        stop_distance: distance,
        stop_loss_price: sample.price - dir * distance,
        take_profit_price: exits.take_profit_k.map(|k| sample.price + dir * k * distance),
    })
}
