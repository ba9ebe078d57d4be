//! Trade intents — the only output of the decision core.
//!
//! Intents are transient: the core does not persist them and never learns
//! whether they were executed except through fill reports.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::sample::PriceSample;
use crate::regime::RegimeBlock;
use crate::risk::{RiskBlock, SizingError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentAction {
    None,
    OpenLong,
    OpenShort,
    Close,
}

/// Why an intent was produced. Every `None` intent carries one, so an idle
/// agent can always explain itself in the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum IntentReason {
    /// Rolling window not yet full.
    InsufficientData,
    /// Flat and the Z-score is inside the entry band.
    NoSignal,
    /// In a position and no exit condition holds.
    Holding,
    /// An order is in flight; nothing else may be emitted until it resolves.
    AwaitingFill,
    /// Flatten requested with nothing open.
    AlreadyFlat,
    RegimeBlocked { block: RegimeBlock },
    RiskBlocked { block: RiskBlock },
    SizingRejected { error: SizingError },
    /// Z-score crossed the entry threshold.
    ZScoreEntry,
    /// |Z| fell back inside the exit band.
    MeanReverted,
    StopLoss,
    TakeProfit,
    /// Risk lock engaged or floating loss breached the daily limit.
    CircuitBreaker,
    ManualFlatten,
}

impl IntentReason {
    /// Stable short code for logs and tallies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientData => "insufficient_data",
            Self::NoSignal => "no_signal",
            Self::Holding => "holding",
            Self::AwaitingFill => "awaiting_fill",
            Self::AlreadyFlat => "already_flat",
            Self::RegimeBlocked { .. } => "regime_blocked",
            Self::RiskBlocked { .. } => "risk_blocked",
            Self::SizingRejected { .. } => "sizing_rejected",
            Self::ZScoreEntry => "zscore_entry",
            Self::MeanReverted => "mean_reverted",
            Self::StopLoss => "stop_loss",
            Self::TakeProfit => "take_profit",
            Self::CircuitBreaker => "circuit_breaker",
            Self::ManualFlatten => "manual_flatten",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub action: IntentAction,
    /// Order size; 0 for `None`.
    pub size: f64,
    /// Protective stop for opens.
    pub stop_loss_price: Option<f64>,
    /// Profit target for opens, when configured.
    pub take_profit_price: Option<f64>,
    /// Price of the sample the decision was made on.
    pub reference_price: f64,
    pub timestamp: NaiveDateTime,
    pub zscore: Option<f64>,
    pub reason: IntentReason,
}

impl TradeIntent {
    pub fn none(sample: &PriceSample, zscore: Option<f64>, reason: IntentReason) -> Self {
        Self {
            action: IntentAction::None,
            size: 0.0,
            stop_loss_price: None,
            take_profit_price: None,
            reference_price: sample.price,
            timestamp: sample.timestamp,
            zscore,
            reason,
        }
    }

    pub fn close(sample: &PriceSample, size: f64, zscore: Option<f64>, reason: IntentReason) -> Self {
        Self {
            action: IntentAction::Close,
            size,
            stop_loss_price: None,
            take_profit_price: None,
            reference_price: sample.price,
            timestamp: sample.timestamp,
            zscore,
            reason,
        }
    }

    pub fn is_none(&self) -> bool {
        self.action == IntentAction::None
    }

    pub fn is_open(&self) -> bool {
        matches!(self.action, IntentAction::OpenLong | IntentAction::OpenShort)
    }
}
