//! Decision engine — the single entry point a driver talks to.
//!
//! Per sample the engine runs:
//!
//! 1. Validation: malformed or out-of-order samples are rejected untouched
//! 2. Statistics: rolling mean, volatility and Z-score
//! 3. Regime: volatility, spread and time-of-day gating
//! 4. Risk: lock and cooldown verdict
//! 5. State machine: exactly one intent
//!
//! Fills and order failures flow back through `report_fill` and
//! `report_order_failed`.

pub mod decision;

pub use decision::{AccountInfo, DecisionEngine, FixedEquity};
