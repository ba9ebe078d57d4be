//! Exit rules for an open position.
//!
//! Precedence when several fire on the same tick: circuit breaker, stop-loss,
//! take-profit, mean reversion. Safety exits never depend on the Z-score
//! being available.

use crate::domain::{IntentReason, Position, PriceSample};
use crate::risk::RiskGovernor;
use crate::stats::ZScore;

pub fn exit_reason(
    position: &Position,
    sample: &PriceSample,
    zscore: ZScore,
    z_exit: f64,
    governor: &RiskGovernor,
) -> Option<IntentReason> {
    if position.is_flat() {
        return None;
    }

    let unrealized = position.unrealized_pnl(sample.price, sample.value_per_price());
    if governor.is_locked() || governor.breaker_tripped(unrealized) {
        return Some(IntentReason::CircuitBreaker);
    }
    if position.stop_hit(sample.price) {
        return Some(IntentReason::StopLoss);
    }
    if position.target_hit(sample.price) {
        return Some(IntentReason::TakeProfit);
    }
    match zscore {
        ZScore::Ready(z) if z.abs() <= z_exit => Some(IntentReason::MeanReverted),
        _ => None,
    }
}
