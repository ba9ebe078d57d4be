//! Risk control — circuit breakers, cooldown and position sizing.

pub mod governor;
pub mod sizing;

pub use governor::{LockReason, RiskBlock, RiskConfig, RiskGovernor, RiskState, RiskVerdict};
pub use sizing::{instrument_size, risk_budget_size, SizingError};
