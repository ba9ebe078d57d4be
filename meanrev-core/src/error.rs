//! Hard failures of the decision core.
//!
//! Expected conditions (warm-up, regime blocks, risk locks, sizing refusals)
//! are `None` intents with a reason code, not errors. Only two things surface
//! here: samples the core refuses to ingest, and collaborator contract
//! violations that would otherwise risk stacking positions.

use thiserror::Error;

use crate::domain::{SampleRejection, Side};

/// A collaborator broke the fill protocol. Core state is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractViolation {
    #[error("entry fill for {fill} while a {open} position is already open")]
    PositionAlreadyOpen { open: Side, fill: Side },

    #[error("{fill} fill reported with no order in flight")]
    NoOrderInFlight { fill: Side },

    #[error("fill side {received} does not match in-flight order ({expected})")]
    FillSideMismatch { expected: Side, received: Side },

    #[error("exit fill reported without realized P&L")]
    MissingClosedPnl,

    #[error("fill price must be positive and finite, got {0}")]
    InvalidFillPrice(f64),

    #[error("order failure reported with no order in flight")]
    NothingToCancel,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("sample rejected: {0}")]
    Rejected(#[from] SampleRejection),

    #[error("contract violation: {0}")]
    ContractViolation(#[from] ContractViolation),
}

impl CoreError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, CoreError::Rejected(_))
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, CoreError::ContractViolation(_))
    }
}
