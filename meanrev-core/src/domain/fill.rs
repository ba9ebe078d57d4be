use serde::{Deserialize, Serialize};

use super::position::Side;

/// Execution feedback from the broker collaborator.
///
/// - Entry fill: `side` is the side opened (`Long` / `Short`), `closed_pnl` is `None`.
/// - Exit fill: `side` is `Flat`, `closed_pnl` carries the realized P&L.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillReport {
    pub side: Side,
    pub fill_price: f64,
    pub closed_pnl: Option<f64>,
}

impl FillReport {
    pub fn entry(side: Side, fill_price: f64) -> Self {
        Self { side, fill_price, closed_pnl: None }
    }

    pub fn exit(fill_price: f64, closed_pnl: f64) -> Self {
        Self {
            side: Side::Flat,
            fill_price,
            closed_pnl: Some(closed_pnl),
        }
    }

    pub fn is_exit(&self) -> bool {
        self.side.is_flat()
    }
}

/// What a fill report did to the position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillOutcome {
    Opened { side: Side, entry_price: f64, size: f64 },
    Closed { side: Side, pnl: f64 },
}
