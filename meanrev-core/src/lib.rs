//! MeanRev Core — the decision core of a single-instrument mean-reversion agent.
//!
//! This crate contains everything that decides, and nothing that talks to a
//! broker:
//! - Domain types (samples, instruments, positions, intents, fills)
//! - Streaming rolling statistics and the Z-score signal
//! - Regime gating (volatility, spread, session and blackout windows)
//! - Risk governor (daily loss limit, loss streak, cooldown, sizing)
//! - Trade state machine with a fill-confirmation protocol
//! - Decision engine tying the components together per sample
//!
//! All time comes from sample timestamps; the core never reads a clock.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod machine;
pub mod regime;
pub mod risk;
pub mod stats;

pub use config::{ConfigError, CoreConfig, ExitConfig, SignalConfig};
pub use domain::{
    FillOutcome, FillReport, InstrumentSpec, IntentAction, IntentReason, Position, PriceSample,
    SampleRejection, Side, TradeIntent,
};
pub use engine::{AccountInfo, DecisionEngine, FixedEquity};
pub use error::{ContractViolation, CoreError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the engine and everything it hands out can move
    /// to a worker thread.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<PriceSample>();
        require_sync::<PriceSample>();
        require_send::<InstrumentSpec>();
        require_sync::<InstrumentSpec>();
        require_send::<Position>();
        require_sync::<Position>();
        require_send::<TradeIntent>();
        require_sync::<TradeIntent>();
        require_send::<FillReport>();
        require_sync::<FillReport>();

        // Components
        require_send::<stats::StatTracker>();
        require_sync::<stats::StatTracker>();
        require_send::<regime::RegimeFilter>();
        require_sync::<regime::RegimeFilter>();
        require_send::<risk::RiskGovernor>();
        require_sync::<risk::RiskGovernor>();
        require_send::<machine::TradeStateMachine>();
        require_sync::<machine::TradeStateMachine>();
        require_send::<DecisionEngine>();
        require_sync::<DecisionEngine>();

        // Errors
        require_send::<CoreError>();
        require_sync::<CoreError>();
    }

    #[test]
    fn intent_serializes_with_reason_code() {
        use chrono::NaiveDate;
        let sample = PriceSample::new(
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_hms_opt(10, 0, 0).unwrap(),
            100.0,
            0.2,
            1.0,
            0.1,
        );
        let intent = TradeIntent::none(&sample, None, IntentReason::InsufficientData);
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["action"], "none");
        assert_eq!(json["reason"]["code"], "insufficient_data");
    }
}
