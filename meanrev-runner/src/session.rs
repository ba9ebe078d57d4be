//! Session driver — feeds samples to the decision engine and closes the loop.
//!
//! Per sample:
//! 1. Calendar-day rollover (from sample timestamps) resets daily risk
//! 2. `decide` produces one intent; rejected samples are logged and skipped
//! 3. Actionable intents become order requests for the sink
//! 4. Fills (or failures) are reported back; realized P&L updates the paper
//!    account that the engine sizes against
//!
//! Contract violations abort the session: they mean the sink and the engine
//! disagree about the position, and carrying on could stack exposure.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use meanrev_core::{
    AccountInfo, CoreError, DecisionEngine, FillOutcome, IntentAction, PriceSample, Side,
    TradeIntent,
};

use crate::config::{AgentConfig, ConfigError, ExecutionConfig};
use crate::journal::{Journal, JournalError, JournalEvent, JournalFilter};
use crate::sink::{ExecutionSink, OrderRequest, SinkError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Journal(#[from] JournalError),
}

impl From<meanrev_core::ConfigError> for SessionError {
    fn from(e: meanrev_core::ConfigError) -> Self {
        SessionError::Config(ConfigError::Invalid(e))
    }
}

/// Starting equity plus realized P&L. Floating P&L is not marked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperAccount {
    pub starting_equity: f64,
    pub realized_pnl: f64,
}

impl PaperAccount {
    pub fn new(starting_equity: f64) -> Self {
        Self {
            starting_equity,
            realized_pnl: 0.0,
        }
    }
}

impl AccountInfo for PaperAccount {
    fn equity(&self) -> f64 {
        self.starting_equity + self.realized_pnl
    }
}

/// What happened over a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub fingerprint: String,
    pub samples_seen: usize,
    pub samples_rejected: usize,
    pub days: usize,
    pub opens: usize,
    pub closes: usize,
    pub orders_failed: usize,
    pub trades_closed: usize,
    pub winning_trades: usize,
    pub lockouts: usize,
    pub realized_pnl: f64,
    pub final_equity: f64,
    /// Position still open when the session ended.
    pub open_position: Side,
    /// Intent count per reason code.
    pub reasons: BTreeMap<String, usize>,
}

impl SessionSummary {
    fn new(fingerprint: String, starting_equity: f64) -> Self {
        Self {
            fingerprint,
            samples_seen: 0,
            samples_rejected: 0,
            days: 0,
            opens: 0,
            closes: 0,
            orders_failed: 0,
            trades_closed: 0,
            winning_trades: 0,
            lockouts: 0,
            realized_pnl: 0.0,
            final_equity: starting_equity,
            open_position: Side::Flat,
            reasons: BTreeMap::new(),
        }
    }

    pub fn win_rate(&self) -> Option<f64> {
        (self.trades_closed > 0).then(|| self.winning_trades as f64 / self.trades_closed as f64)
    }
}

pub struct Session<S: ExecutionSink> {
    engine: DecisionEngine,
    sink: S,
    account: PaperAccount,
    execution: ExecutionConfig,
    journal: Option<Journal>,
    current_day: Option<NaiveDate>,
    last_value_per_price: f64,
    summary: SessionSummary,
}

impl<S: ExecutionSink> Session<S> {
    pub fn new(config: &AgentConfig, sink: S) -> Result<Self, SessionError> {
        config.validate()?;
        let fingerprint = config.fingerprint()?;
        let engine = DecisionEngine::new(config.strategy.clone(), config.instrument.clone())?;

        let journal = config.journal.path.clone().map(|path| {
            Journal::new(
                path,
                JournalFilter {
                    include_idle: config.journal.include_idle,
                },
            )
        });

        info!(
            symbol = %config.instrument.symbol,
            %fingerprint,
            dry_run = config.execution.dry_run,
            equity = config.account.starting_equity,
            "session start"
        );

        let session = Self {
            engine,
            sink,
            account: PaperAccount::new(config.account.starting_equity),
            execution: config.execution.clone(),
            journal,
            current_day: None,
            last_value_per_price: 1.0,
            summary: SessionSummary::new(fingerprint.clone(), config.account.starting_equity),
        };
        session.record(
            None,
            JournalEvent::SessionStart {
                fingerprint,
                symbol: config.instrument.symbol.clone(),
                dry_run: config.execution.dry_run,
            },
        )?;
        Ok(session)
    }

    /// Replay every sample, then finish (flattening any open position).
    pub fn run<I>(mut self, samples: I) -> Result<SessionSummary, SessionError>
    where
        I: IntoIterator<Item = PriceSample>,
    {
        for sample in samples {
            self.step(&sample)?;
        }
        self.finish(true)
    }

    /// Process one sample end to end.
    pub fn step(&mut self, sample: &PriceSample) -> Result<(), SessionError> {
        self.summary.samples_seen += 1;
        self.roll_day(sample)?;

        let intent = match self.engine.decide(sample, &self.account) {
            Ok(intent) => intent,
            Err(CoreError::Rejected(reason)) => {
                warn!(%reason, "sample rejected");
                self.summary.samples_rejected += 1;
                self.record(
                    Some(sample.timestamp),
                    JournalEvent::SampleRejected {
                        reason: reason.to_string(),
                    },
                )?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        self.last_value_per_price = sample.value_per_price();

        *self
            .summary
            .reasons
            .entry(intent.reason.code().to_string())
            .or_default() += 1;
        self.record(
            Some(sample.timestamp),
            JournalEvent::Intent {
                intent: intent.clone(),
            },
        )?;
        self.execute(&intent, self.last_value_per_price)
    }

    /// Optionally flatten, then close out the summary.
    pub fn finish(mut self, flatten: bool) -> Result<SessionSummary, SessionError> {
        if flatten && !self.engine.position().is_flat() && self.engine.pending().is_none() {
            if let Some(intent) = self.engine.flatten() {
                info!(side = %self.engine.position().side, "flattening at session end");
                self.record(
                    Some(intent.timestamp),
                    JournalEvent::Intent {
                        intent: intent.clone(),
                    },
                )?;
                self.execute(&intent, self.last_value_per_price)?;
            }
        }

        self.summary.final_equity = self.account.equity();
        self.summary.open_position = self.engine.position().side;
        let at = self.engine.last_timestamp();
        self.record(
            at,
            JournalEvent::SessionEnd {
                summary: self.summary.clone(),
            },
        )?;

        info!(
            trades = self.summary.trades_closed,
            pnl = self.summary.realized_pnl,
            equity = self.summary.final_equity,
            rejected = self.summary.samples_rejected,
            "session end"
        );
        Ok(self.summary)
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    pub fn account(&self) -> &PaperAccount {
        &self.account
    }

    fn roll_day(&mut self, sample: &PriceSample) -> Result<(), SessionError> {
        // a sample the engine will reject must not advance the calendar
        if sample.validate().is_err()
            || self
                .engine
                .last_timestamp()
                .is_some_and(|last| sample.timestamp <= last)
        {
            return Ok(());
        }

        let date = sample.timestamp.date();
        match self.current_day {
            None => {
                self.current_day = Some(date);
                self.summary.days = 1;
            }
            Some(day) if day != date => {
                info!(%date, "new trading day");
                self.engine.on_new_day();
                self.current_day = Some(date);
                self.summary.days += 1;
                self.record(Some(sample.timestamp), JournalEvent::NewDay { date })?;
            }
            Some(_) => {}
        }
        Ok(())
    }

    fn execute(&mut self, intent: &TradeIntent, value_per_price: f64) -> Result<(), SessionError> {
        let Some(request) = OrderRequest::from_intent(
            intent,
            self.engine.position(),
            self.engine.instrument(),
            &self.execution,
            value_per_price,
        ) else {
            return Ok(());
        };

        match intent.action {
            IntentAction::OpenLong | IntentAction::OpenShort => self.summary.opens += 1,
            IntentAction::Close => self.summary.closes += 1,
            IntentAction::None => {}
        }

        match self.sink.submit(&request) {
            Ok(fill) => {
                let was_locked = self.engine.risk_state().trading_locked;
                let outcome = self.engine.report_fill(fill)?;
                if let FillOutcome::Closed { pnl, .. } = outcome {
                    self.account.realized_pnl += pnl;
                    self.summary.realized_pnl += pnl;
                    self.summary.trades_closed += 1;
                    if pnl > 0.0 {
                        self.summary.winning_trades += 1;
                    }
                }
                if !was_locked && self.engine.risk_state().trading_locked {
                    self.summary.lockouts += 1;
                }
                self.record(
                    Some(request.timestamp),
                    JournalEvent::Fill {
                        outcome,
                        fill_price: fill.fill_price,
                    },
                )?;
            }
            Err(SinkError::Rejected { reason }) => {
                warn!(%reason, "order rejected");
                self.engine.report_order_failed()?;
                self.summary.orders_failed += 1;
                self.record(Some(request.timestamp), JournalEvent::OrderFailed { reason })?;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn record(&self, at: Option<NaiveDateTime>, event: JournalEvent) -> Result<(), SessionError> {
        if let Some(journal) = &self.journal {
            journal.append(at, event)?;
        }
        Ok(())
    }
}
