//! Execution sinks — where intents turn into (simulated) orders.
//!
//! The core never talks to a broker. The session translates each actionable
//! intent into an [`OrderRequest`] and hands it to an [`ExecutionSink`],
//! which answers with a fill or a rejection.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use chrono::NaiveDateTime;
use meanrev_core::{FillReport, InstrumentSpec, IntentAction, Position, Side, TradeIntent};

use crate::config::ExecutionConfig;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SinkError {
    /// The broker refused the order; the session reports an order failure
    /// and carries on.
    #[error("order rejected: {reason}")]
    Rejected { reason: String },

    /// The sink cannot continue at all.
    #[error("execution unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    Buy,
    Sell,
}

/// What the order does to the position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderKind {
    Open { side: Side },
    Close { side: Side, entry_price: f64 },
}

/// A market order as a broker would receive it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub kind: OrderKind,
    pub direction: OrderDirection,
    pub volume: f64,
    pub price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub deviation: u32,
    pub magic: u64,
    pub comment: String,
    /// Money per unit price move per unit volume, for P&L.
    pub value_per_price: f64,
    pub timestamp: NaiveDateTime,
}

impl OrderRequest {
    /// Translate an actionable intent. Returns `None` for `None` intents and
    /// for closes with no open position to reference.
    pub fn from_intent(
        intent: &TradeIntent,
        position: &Position,
        instrument: &InstrumentSpec,
        execution: &ExecutionConfig,
        value_per_price: f64,
    ) -> Option<Self> {
        let (kind, direction) = match intent.action {
            IntentAction::None => return None,
            IntentAction::OpenLong => (OrderKind::Open { side: Side::Long }, OrderDirection::Buy),
            IntentAction::OpenShort => {
                (OrderKind::Open { side: Side::Short }, OrderDirection::Sell)
            }
            IntentAction::Close => {
                let entry_price = position.entry_price?;
                let direction = match position.side {
                    Side::Long => OrderDirection::Sell,
                    Side::Short => OrderDirection::Buy,
                    Side::Flat => return None,
                };
                (
                    OrderKind::Close {
                        side: position.side,
                        entry_price,
                    },
                    direction,
                )
            }
        };

        Some(Self {
            symbol: instrument.symbol.clone(),
            kind,
            direction,
            volume: intent.size,
            price: intent.reference_price,
            stop_loss: intent.stop_loss_price,
            take_profit: intent.take_profit_price,
            deviation: execution.deviation,
            magic: execution.magic,
            comment: execution.comment.clone(),
            value_per_price,
            timestamp: intent.timestamp,
        })
    }

    /// Realized P&L if a close of this request fills at `fill_price`.
    pub fn closed_pnl(&self, fill_price: f64) -> Option<f64> {
        match self.kind {
            OrderKind::Close { side, entry_price } => {
                Some((fill_price - entry_price) * side.sign() * self.volume * self.value_per_price)
            }
            OrderKind::Open { .. } => None,
        }
    }

    /// The fill report for a fill of this request at `fill_price`.
    pub fn fill_at(&self, fill_price: f64) -> FillReport {
        match self.kind {
            OrderKind::Open { side } => FillReport::entry(side, fill_price),
            OrderKind::Close { .. } => {
                FillReport::exit(fill_price, self.closed_pnl(fill_price).unwrap_or_default())
            }
        }
    }
}

/// Anything that can execute an order request.
pub trait ExecutionSink {
    fn submit(&mut self, request: &OrderRequest) -> Result<FillReport, SinkError>;
}

/// Logs every request and fills it at the reference price.
#[derive(Debug, Clone, Default)]
pub struct DryRunSink {
    submitted: usize,
}

impl DryRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }
}

impl ExecutionSink for DryRunSink {
    fn submit(&mut self, request: &OrderRequest) -> Result<FillReport, SinkError> {
        self.submitted += 1;
        info!(
            symbol = %request.symbol,
            direction = ?request.direction,
            volume = request.volume,
            price = request.price,
            sl = ?request.stop_loss,
            tp = ?request.take_profit,
            deviation = request.deviation,
            magic = request.magic,
            comment = %request.comment,
            "DRY RUN ORDER"
        );
        Ok(request.fill_at(request.price))
    }
}

/// Records every request; fills like [`DryRunSink`] unless told to reject.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub requests: Vec<OrderRequest>,
    reject_next: usize,
    slippage: f64,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `n` submissions.
    pub fn reject_next(&mut self, n: usize) {
        self.reject_next = n;
    }

    /// Fill every order `slippage` price units worse than requested.
    pub fn with_slippage(mut self, slippage: f64) -> Self {
        self.slippage = slippage;
        self
    }
}

impl ExecutionSink for RecordingSink {
    fn submit(&mut self, request: &OrderRequest) -> Result<FillReport, SinkError> {
        self.requests.push(request.clone());
        if self.reject_next > 0 {
            self.reject_next -= 1;
            return Err(SinkError::Rejected {
                reason: "requote".to_string(),
            });
        }
        let fill_price = match request.direction {
            OrderDirection::Buy => request.price + self.slippage,
            OrderDirection::Sell => request.price - self.slippage,
        };
        Ok(request.fill_at(fill_price))
    }
}
