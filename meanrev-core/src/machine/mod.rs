//! Trade state machine — the authoritative position for one instrument.
//!
//! States are `Flat`, `Long` and `Short`. Every emitted open/close puts the
//! machine into an awaiting-fill state; the transition completes only when
//! the execution collaborator reports the fill:
//!
//! ```text
//! Flat --open intent--> (awaiting entry) --entry fill--> Long | Short
//! Long | Short --close intent--> (awaiting exit) --exit fill--> Flat
//! ```
//!
//! There is no Long -> Short edge: a reversal always passes through Flat.
//! Risk locks are not a state; the machine stays Flat and entries are refused.

pub mod entry;
pub mod exit;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{ExitConfig, SignalConfig};
use crate::domain::{
    FillOutcome, FillReport, IntentAction, IntentReason, Position, PriceSample, Side, TradeIntent,
};
use crate::error::ContractViolation;
use crate::regime::RegimeVerdict;
use crate::risk::{RiskGovernor, RiskVerdict};
use crate::stats::StatReading;

pub use entry::{plan_entry, signal_side, stop_distance, EntryPlan};
pub use exit::exit_reason;

/// The order most recently emitted and not yet resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingOrder {
    Entry {
        side: Side,
        size: f64,
        stop_loss_price: f64,
        take_profit_price: Option<f64>,
        submitted_at: NaiveDateTime,
    },
    Exit {
        side: Side,
        reason: IntentReason,
        submitted_at: NaiveDateTime,
    },
}

/// Immutable verdicts gathered for one tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub sample: &'a PriceSample,
    pub reading: &'a StatReading,
    pub regime: &'a RegimeVerdict,
    pub risk: &'a RiskVerdict,
    pub equity: f64,
}

#[derive(Debug, Clone)]
pub struct TradeStateMachine {
    signal: SignalConfig,
    exits: ExitConfig,
    position: Position,
    pending: Option<PendingOrder>,
}

impl TradeStateMachine {
    pub fn new(signal: SignalConfig, exits: ExitConfig) -> Self {
        Self {
            signal,
            exits,
            position: Position::flat(),
            pending: None,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn pending(&self) -> Option<&PendingOrder> {
        self.pending.as_ref()
    }

    pub fn side(&self) -> Side {
        self.position.side
    }

    /// Advance one tick. Always returns exactly one intent.
    pub fn on_tick(&mut self, ctx: &TickContext<'_>, governor: &RiskGovernor) -> TradeIntent {
        let sample = ctx.sample;
        let z = ctx.reading.zscore.value();

        if self.pending.is_some() {
            return TradeIntent::none(sample, z, IntentReason::AwaitingFill);
        }

        if self.position.is_flat() {
            self.on_flat_tick(ctx, governor)
        } else {
            self.on_open_tick(ctx, governor)
        }
    }

    fn on_flat_tick(&mut self, ctx: &TickContext<'_>, governor: &RiskGovernor) -> TradeIntent {
        let sample = ctx.sample;
        let z = ctx.reading.zscore.value();

        let plan = match plan_entry(
            sample,
            ctx.reading,
            ctx.regime,
            ctx.risk,
            ctx.equity,
            governor,
            &self.signal,
            &self.exits,
        ) {
            Ok(plan) => plan,
            Err(reason) => {
                match &reason {
                    IntentReason::RegimeBlocked { .. }
                    | IntentReason::RiskBlocked { .. }
                    | IntentReason::SizingRejected { .. } => {
                        debug!(zscore = ?z, reason = ?reason, "entry signal refused")
                    }
                    _ => {}
                }
                return TradeIntent::none(sample, z, reason);
            }
        };

        let action = match plan.side {
            Side::Long => IntentAction::OpenLong,
            Side::Short => IntentAction::OpenShort,
            Side::Flat => return TradeIntent::none(sample, z, IntentReason::NoSignal),
        };

        info!(
            side = %plan.side,
            size = plan.size,
            price = sample.price,
            stop = plan.stop_loss_price,
            zscore = ?z,
            "entry"
        );

        self.pending = Some(PendingOrder::Entry {
            side: plan.side,
            size: plan.size,
            stop_loss_price: plan.stop_loss_price,
            take_profit_price: plan.take_profit_price,
            submitted_at: sample.timestamp,
        });

        TradeIntent {
            action,
            size: plan.size,
            stop_loss_price: Some(plan.stop_loss_price),
            take_profit_price: plan.take_profit_price,
            reference_price: sample.price,
            timestamp: sample.timestamp,
            zscore: z,
            reason: IntentReason::ZScoreEntry,
        }
    }

    fn on_open_tick(&mut self, ctx: &TickContext<'_>, governor: &RiskGovernor) -> TradeIntent {
        let sample = ctx.sample;
        let z = ctx.reading.zscore.value();

        match exit_reason(
            &self.position,
            sample,
            ctx.reading.zscore,
            self.signal.z_exit,
            governor,
        ) {
            Some(reason) => self.emit_close(sample, z, reason),
            None => TradeIntent::none(sample, z, IntentReason::Holding),
        }
    }

    fn emit_close(&mut self, sample: &PriceSample, z: Option<f64>, reason: IntentReason) -> TradeIntent {
        info!(
            side = %self.position.side,
            size = self.position.size,
            price = sample.price,
            reason = reason.code(),
            "exit"
        );
        self.pending = Some(PendingOrder::Exit {
            side: self.position.side,
            reason: reason.clone(),
            submitted_at: sample.timestamp,
        });
        TradeIntent::close(sample, self.position.size, z, reason)
    }

    /// Explicit flatten command. Emits a close for an open position with no
    /// order in flight; otherwise a `None` intent saying why not.
    pub fn flatten(&mut self, sample: &PriceSample) -> TradeIntent {
        if self.pending.is_some() {
            return TradeIntent::none(sample, None, IntentReason::AwaitingFill);
        }
        if self.position.is_flat() {
            return TradeIntent::none(sample, None, IntentReason::AlreadyFlat);
        }
        self.emit_close(sample, None, IntentReason::ManualFlatten)
    }

    /// Complete the in-flight order with a fill report.
    ///
    /// An exit fill records the realized P&L with the governor before the
    /// position becomes flat. A fill that does not match the in-flight order
    /// is a contract violation and leaves the machine untouched.
    pub fn on_fill(
        &mut self,
        fill: &FillReport,
        governor: &mut RiskGovernor,
        at: NaiveDateTime,
    ) -> Result<FillOutcome, ContractViolation> {
        if !fill.fill_price.is_finite() || fill.fill_price <= 0.0 {
            return Err(ContractViolation::InvalidFillPrice(fill.fill_price));
        }

        match (&self.pending, fill.side) {
            (None, side) if !self.position.is_flat() && !side.is_flat() => {
                Err(ContractViolation::PositionAlreadyOpen {
                    open: self.position.side,
                    fill: side,
                })
            }
            (None, side) => Err(ContractViolation::NoOrderInFlight { fill: side }),
            (Some(PendingOrder::Entry { side, .. }), received) if *side != received => {
                Err(ContractViolation::FillSideMismatch {
                    expected: *side,
                    received,
                })
            }
            (Some(PendingOrder::Exit { .. }), received) if !received.is_flat() => {
                Err(ContractViolation::FillSideMismatch {
                    expected: Side::Flat,
                    received,
                })
            }
            (Some(PendingOrder::Exit { .. }), _) if fill.closed_pnl.is_none() => {
                Err(ContractViolation::MissingClosedPnl)
            }
            (Some(PendingOrder::Entry { side, size, stop_loss_price, take_profit_price, .. }), _) => {
                let (side, size) = (*side, *size);
                self.position = Position::open(
                    side,
                    fill.fill_price,
                    size,
                    *stop_loss_price,
                    *take_profit_price,
                    at,
                );
                self.pending = None;
                info!(%side, size, entry = fill.fill_price, "position opened");
                Ok(FillOutcome::Opened {
                    side,
                    entry_price: fill.fill_price,
                    size,
                })
            }
            (Some(PendingOrder::Exit { side, .. }), _) => {
                let side = *side;
                let pnl = fill.closed_pnl.unwrap_or_default();
                governor.on_trade_closed(pnl, at);
                self.position = Position::flat();
                self.pending = None;
                info!(%side, pnl, exit = fill.fill_price, "position closed");
                Ok(FillOutcome::Closed { side, pnl })
            }
        }
    }

    /// The in-flight order failed (rejected, timed out, disconnected).
    ///
    /// A failed entry leaves the machine flat; a failed exit leaves the
    /// position open so exits are re-evaluated on the next tick.
    pub fn on_order_failed(&mut self) -> Result<PendingOrder, ContractViolation> {
        let pending = self.pending.take().ok_or(ContractViolation::NothingToCancel)?;
        warn!(order = ?pending, "in-flight order failed");
        Ok(pending)
    }

    /// Hard reset to flat with nothing in flight (after manual reconciliation).
    pub fn reset(&mut self) {
        if !self.position.is_flat() || self.pending.is_some() {
            warn!(position = ?self.position, pending = ?self.pending, "state machine reset");
        }
        self.position = Position::flat();
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InstrumentSpec;
    use crate::risk::RiskConfig;
    use crate::stats::ZScore;
    use chrono::{Duration, NaiveDate};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    fn sample(i: i64, price: f64) -> PriceSample {
        PriceSample::new(t0() + Duration::minutes(i), price, 0.2, 1.0, 0.1)
    }

    fn machine() -> TradeStateMachine {
        TradeStateMachine::new(
            SignalConfig { window_size: 5, z_enter: 2.0, z_exit: 0.5, epsilon: 1e-9 },
            ExitConfig { stop_loss_k: 2.0, take_profit_k: None, min_stop_fraction: 0.0 },
        )
    }

    fn governor() -> RiskGovernor {
        RiskGovernor::new(
            RiskConfig { risk_pct: 0.01, max_daily_loss: 1_000.0, max_consecutive_losses: 3, cooldown_secs: 0 },
            InstrumentSpec::default(),
        )
    }

    fn clear() -> RegimeVerdict {
        RegimeVerdict { volatility_ok: true, spread_ok: true, time_ok: true, block: None }
    }

    fn tick(m: &mut TradeStateMachine, g: &RiskGovernor, s: &PriceSample, z: f64) -> TradeIntent {
        let reading = StatReading { zscore: ZScore::Ready(z), volatility: 2.5, mean: s.price };
        let regime = clear();
        let risk = g.entry_verdict(s.timestamp);
        let ctx = TickContext { sample: s, reading: &reading, regime: &regime, risk: &risk, equity: 10_000.0 };
        m.on_tick(&ctx, g)
    }

    #[test]
    fn enter_hold_exit_cycle() {
        let mut m = machine();
        let mut g = governor();

        let s = sample(0, 100.0);
        let open = tick(&mut m, &g, &s, -2.1);
        assert_eq!(open.action, IntentAction::OpenLong);
        assert_eq!(open.stop_loss_price, Some(95.0));
        assert!(matches!(m.pending(), Some(PendingOrder::Entry { .. })));
        assert_eq!(m.side(), Side::Flat);

        let outcome = m.on_fill(&FillReport::entry(Side::Long, 100.1), &mut g, s.timestamp).unwrap();
        assert!(matches!(outcome, FillOutcome::Opened { side: Side::Long, .. }));
        assert_eq!(m.side(), Side::Long);
        assert_eq!(m.position().entry_price, Some(100.1));

        for (i, z) in [(1, -1.9), (2, -1.0), (3, 0.6)] {
            let intent = tick(&mut m, &g, &sample(i, 100.5), z);
            assert!(intent.is_none());
            assert_eq!(intent.reason, IntentReason::Holding);
        }

        let close = tick(&mut m, &g, &sample(4, 101.0), 0.4);
        assert_eq!(close.action, IntentAction::Close);
        assert_eq!(close.reason, IntentReason::MeanReverted);
        assert_eq!(m.side(), Side::Long);

        m.on_fill(&FillReport::exit(101.0, 18.0), &mut g, sample(4, 101.0).timestamp).unwrap();
        assert!(m.position().is_flat());
        assert_eq!(g.state().daily_pnl, 18.0);
    }

    #[test]
    fn awaiting_fill_suppresses_new_orders() {
        let mut m = machine();
        let g = governor();
        tick(&mut m, &g, &sample(0, 100.0), -3.0);
        let again = tick(&mut m, &g, &sample(1, 99.0), -3.5);
        assert!(again.is_none());
        assert_eq!(again.reason, IntentReason::AwaitingFill);
    }

    #[test]
    fn no_direct_flip_from_long_to_short() {
        let mut m = machine();
        let mut g = governor();
        tick(&mut m, &g, &sample(0, 100.0), -2.5);
        m.on_fill(&FillReport::entry(Side::Long, 100.0), &mut g, t0()).unwrap();

        // strong opposite signal while long: never OpenShort
        let intent = tick(&mut m, &g, &sample(1, 103.0), 3.0);
        assert_ne!(intent.action, IntentAction::OpenShort);
        assert_eq!(intent.reason, IntentReason::Holding);
    }

    #[test]
    fn duplicate_entry_fill_is_a_violation() {
        let mut m = machine();
        let mut g = governor();
        tick(&mut m, &g, &sample(0, 100.0), -2.5);
        m.on_fill(&FillReport::entry(Side::Long, 100.0), &mut g, t0()).unwrap();

        let err = m.on_fill(&FillReport::entry(Side::Long, 100.0), &mut g, t0()).unwrap_err();
        assert_eq!(err, ContractViolation::PositionAlreadyOpen { open: Side::Long, fill: Side::Long });
        assert_eq!(m.side(), Side::Long);
        assert_eq!(m.position().size, 2.0);
    }

    #[test]
    fn wrong_side_fill_leaves_pending_intact() {
        let mut m = machine();
        let mut g = governor();
        tick(&mut m, &g, &sample(0, 100.0), -2.5);
        let err = m.on_fill(&FillReport::entry(Side::Short, 100.0), &mut g, t0()).unwrap_err();
        assert_eq!(err, ContractViolation::FillSideMismatch { expected: Side::Long, received: Side::Short });
        assert!(m.pending().is_some());
    }

    #[test]
    fn exit_fill_requires_pnl() {
        let mut m = machine();
        let mut g = governor();
        tick(&mut m, &g, &sample(0, 100.0), -2.5);
        m.on_fill(&FillReport::entry(Side::Long, 100.0), &mut g, t0()).unwrap();
        tick(&mut m, &g, &sample(1, 100.0), 0.0);

        let no_pnl = FillReport { side: Side::Flat, fill_price: 100.0, closed_pnl: None };
        assert_eq!(m.on_fill(&no_pnl, &mut g, t0()), Err(ContractViolation::MissingClosedPnl));
        assert_eq!(m.side(), Side::Long);
    }

    #[test]
    fn fill_with_nothing_in_flight() {
        let mut m = machine();
        let mut g = governor();
        assert_eq!(
            m.on_fill(&FillReport::exit(100.0, 1.0), &mut g, t0()),
            Err(ContractViolation::NoOrderInFlight { fill: Side::Flat })
        );
    }

    #[test]
    fn failed_entry_returns_to_flat() {
        let mut m = machine();
        let g = governor();
        tick(&mut m, &g, &sample(0, 100.0), -2.5);
        assert!(matches!(m.on_order_failed(), Ok(PendingOrder::Entry { .. })));
        assert!(m.pending().is_none());
        assert!(m.position().is_flat());
        assert_eq!(m.on_order_failed(), Err(ContractViolation::NothingToCancel));
    }

    #[test]
    fn failed_exit_retries_next_tick() {
        let mut m = machine();
        let mut g = governor();
        tick(&mut m, &g, &sample(0, 100.0), -2.5);
        m.on_fill(&FillReport::entry(Side::Long, 100.0), &mut g, t0()).unwrap();
        assert_eq!(tick(&mut m, &g, &sample(1, 100.0), 0.1).action, IntentAction::Close);
        m.on_order_failed().unwrap();
        assert_eq!(m.side(), Side::Long);
        assert_eq!(tick(&mut m, &g, &sample(2, 100.0), 0.1).action, IntentAction::Close);
    }

    #[test]
    fn flatten_command() {
        let mut m = machine();
        let mut g = governor();
        assert_eq!(m.flatten(&sample(0, 100.0)).reason, IntentReason::AlreadyFlat);

        tick(&mut m, &g, &sample(0, 100.0), -2.5);
        assert_eq!(m.flatten(&sample(1, 100.0)).reason, IntentReason::AwaitingFill);

        m.on_fill(&FillReport::entry(Side::Long, 100.0), &mut g, t0()).unwrap();
        let close = m.flatten(&sample(2, 100.0));
        assert_eq!(close.action, IntentAction::Close);
        assert_eq!(close.reason, IntentReason::ManualFlatten);
        assert_eq!(close.size, 2.0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut m = machine();
        let mut g = governor();
        tick(&mut m, &g, &sample(0, 100.0), -2.5);
        m.on_fill(&FillReport::entry(Side::Long, 100.0), &mut g, t0()).unwrap();
        m.reset();
        assert!(m.position().is_flat());
        assert!(m.pending().is_none());
    }
}
