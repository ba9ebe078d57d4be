//! The per-sample decision pipeline.

use chrono::NaiveDateTime;
use tracing::{debug, info, trace};

use crate::config::{ConfigError, CoreConfig};
use crate::domain::{
    FillOutcome, FillReport, InstrumentSpec, Position, PriceSample, SampleRejection, TradeIntent,
};
use crate::error::{ContractViolation, CoreError};
use crate::machine::{PendingOrder, TickContext, TradeStateMachine};
use crate::regime::RegimeFilter;
use crate::risk::{RiskGovernor, RiskState};
use crate::stats::{RollingStats, StatTracker};

/// Read-only view of the trading account. Queried once per sample.
pub trait AccountInfo {
    fn equity(&self) -> f64;
}

/// Constant equity, for replays and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedEquity(pub f64);

impl AccountInfo for FixedEquity {
    fn equity(&self) -> f64 {
        self.0
    }
}

/// Owns every stateful component for one instrument and runs them in a
/// fixed order on each sample: statistics, regime, risk, state machine.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: CoreConfig,
    instrument: InstrumentSpec,
    tracker: StatTracker,
    regime: RegimeFilter,
    governor: RiskGovernor,
    machine: TradeStateMachine,
    last_sample: Option<PriceSample>,
}

impl DecisionEngine {
    pub fn new(config: CoreConfig, instrument: InstrumentSpec) -> Result<Self, ConfigError> {
        config.validate()?;
        instrument.validate()?;

        info!(
            symbol = %instrument.symbol,
            window = config.signal.window_size,
            z_enter = config.signal.z_enter,
            z_exit = config.signal.z_exit,
            "decision engine ready"
        );

        Ok(Self {
            tracker: StatTracker::new(config.signal.window_size, config.signal.epsilon),
            regime: RegimeFilter::new(config.regime.clone()),
            governor: RiskGovernor::new(config.risk.clone(), instrument.clone()),
            machine: TradeStateMachine::new(config.signal.clone(), config.exits.clone()),
            config,
            instrument,
            last_sample: None,
        })
    }

    /// Process one sample and return exactly one intent.
    ///
    /// A rejected sample returns an error and leaves every component exactly
    /// as it was.
    pub fn decide(
        &mut self,
        sample: &PriceSample,
        account: &dyn AccountInfo,
    ) -> Result<TradeIntent, CoreError> {
        sample.validate()?;
        if let Some(last) = self.last_timestamp() {
            if sample.timestamp <= last {
                return Err(SampleRejection::OutOfOrder {
                    last,
                    received: sample.timestamp,
                }
                .into());
            }
        }

        let reading = self.tracker.update(sample);
        let regime = self
            .regime
            .evaluate(reading.volatility, sample.spread, sample.timestamp);
        let risk = self.governor.entry_verdict(sample.timestamp);

        let ctx = TickContext {
            sample,
            reading: &reading,
            regime: &regime,
            risk: &risk,
            equity: account.equity(),
        };
        let intent = self.machine.on_tick(&ctx, &self.governor);
        self.last_sample = Some(*sample);

        trace!(
            price = sample.price,
            zscore = ?reading.zscore.value(),
            volatility = reading.volatility,
            "sample"
        );
        if !intent.is_none() {
            debug!(action = ?intent.action, reason = intent.reason.code(), "intent");
        }
        Ok(intent)
    }

    /// Resolve the in-flight order. The fill is stamped with the time of the
    /// most recent accepted sample.
    pub fn report_fill(&mut self, fill: FillReport) -> Result<FillOutcome, CoreError> {
        let at = self
            .last_timestamp()
            .ok_or(ContractViolation::NoOrderInFlight { fill: fill.side })?;
        Ok(self.machine.on_fill(&fill, &mut self.governor, at)?)
    }

    /// The in-flight order was rejected or timed out.
    pub fn report_order_failed(&mut self) -> Result<PendingOrder, CoreError> {
        Ok(self.machine.on_order_failed()?)
    }

    /// Session boundary: resets the daily risk counters.
    pub fn on_new_day(&mut self) {
        self.governor.on_new_day();
    }

    /// Close any open position at the last seen price. `None` before the
    /// first accepted sample.
    pub fn flatten(&mut self) -> Option<TradeIntent> {
        let sample = self.last_sample?;
        Some(self.machine.flatten(&sample))
    }

    /// Drop position and in-flight order after manual reconciliation.
    /// Statistics and risk counters are kept.
    pub fn reset(&mut self) {
        self.machine.reset();
    }

    pub fn position(&self) -> &Position {
        self.machine.position()
    }

    pub fn pending(&self) -> Option<&PendingOrder> {
        self.machine.pending()
    }

    pub fn risk_state(&self) -> &RiskState {
        self.governor.state()
    }

    pub fn rolling_stats(&self) -> RollingStats {
        self.tracker.stats()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn instrument(&self) -> &InstrumentSpec {
        &self.instrument
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.last_sample.as_ref().map(|s| s.timestamp)
    }
}
