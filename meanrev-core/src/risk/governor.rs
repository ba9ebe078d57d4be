//! Risk governor — daily loss breaker, loss-streak lock, cooldown, sizing.
//!
//! Mutated only by `on_trade_closed` and `on_new_day`. Locks never clear
//! mid-day: once engaged the agent sits out the rest of the session.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use super::sizing::{instrument_size, SizingError};
use crate::domain::InstrumentSpec;

/// Static risk limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Fraction of equity risked per trade (0.003 = 0.3%).
    pub risk_pct: f64,
    /// Daily realized loss (account currency) at which trading locks.
    pub max_daily_loss: f64,
    pub max_consecutive_losses: u32,
    /// Minimum seconds between a trade close and the next entry.
    pub cooldown_secs: i64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_pct: 0.003,
            max_daily_loss: 100.0,
            max_consecutive_losses: 3,
            cooldown_secs: 180,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockReason {
    DailyLossLimit,
    LossStreak,
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockReason::DailyLossLimit => f.write_str("daily_loss_limit"),
            LockReason::LossStreak => f.write_str("loss_streak"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    pub daily_pnl: f64,
    pub consecutive_losses: u32,
    pub last_trade_time: Option<NaiveDateTime>,
    pub trading_locked: bool,
    pub lock_reason: Option<LockReason>,
}

impl Default for RiskState {
    fn default() -> Self {
        Self {
            daily_pnl: 0.0,
            consecutive_losses: 0,
            last_trade_time: None,
            trading_locked: false,
            lock_reason: None,
        }
    }
}

/// Why the governor refused an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskBlock {
    Locked { reason: LockReason },
    Cooldown { remaining_secs: i64 },
}

/// Entry permission for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskVerdict {
    pub block: Option<RiskBlock>,
}

impl RiskVerdict {
    pub fn allowed() -> Self {
        Self { block: None }
    }

    pub fn is_allowed(&self) -> bool {
        self.block.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct RiskGovernor {
    config: RiskConfig,
    instrument: InstrumentSpec,
    state: RiskState,
}

impl RiskGovernor {
    pub fn new(config: RiskConfig, instrument: InstrumentSpec) -> Self {
        Self {
            config,
            instrument,
            state: RiskState::default(),
        }
    }

    pub fn state(&self) -> &RiskState {
        &self.state
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn risk_pct(&self) -> f64 {
        self.config.risk_pct
    }

    pub fn is_locked(&self) -> bool {
        self.state.trading_locked
    }

    /// Entry permission at `now`: locks first, then cooldown.
    pub fn entry_verdict(&self, now: NaiveDateTime) -> RiskVerdict {
        if let Some(reason) = self.state.lock_reason.filter(|_| self.state.trading_locked) {
            return RiskVerdict {
                block: Some(RiskBlock::Locked { reason }),
            };
        }
        if let Some(last) = self.state.last_trade_time {
            let cooldown = Duration::seconds(self.config.cooldown_secs);
            let elapsed = now - last;
            if elapsed < cooldown {
                return RiskVerdict {
                    block: Some(RiskBlock::Cooldown {
                        remaining_secs: (cooldown - elapsed).num_seconds(),
                    }),
                };
            }
        }
        RiskVerdict::allowed()
    }

    pub fn can_enter(&self, now: NaiveDateTime) -> bool {
        self.entry_verdict(now).is_allowed()
    }

    /// Size for a new entry, rounded to the instrument's volume rules.
    pub fn position_size(
        &self,
        equity: f64,
        risk_pct: f64,
        stop_distance: f64,
        tick_value: f64,
        tick_size: f64,
    ) -> Result<f64, SizingError> {
        instrument_size(&self.instrument, equity, risk_pct, stop_distance, tick_value, tick_size)
    }

    /// Would realized plus floating P&L breach the daily loss limit?
    ///
    /// Pure query: the lock itself is recorded once the closing fill reports
    /// the realized loss.
    pub fn breaker_tripped(&self, unrealized_pnl: f64) -> bool {
        self.state.daily_pnl + unrealized_pnl <= -self.config.max_daily_loss
    }

    /// Record a closed trade. Returns the lock reason if this close engaged
    /// a lock that was not already engaged.
    pub fn on_trade_closed(&mut self, pnl: f64, at: NaiveDateTime) -> Option<LockReason> {
        self.state.daily_pnl += pnl;
        self.state.last_trade_time = Some(at);

        if pnl < 0.0 {
            self.state.consecutive_losses += 1;
        } else if pnl > 0.0 {
            self.state.consecutive_losses = 0;
        }

        info!(
            pnl,
            daily_pnl = self.state.daily_pnl,
            consecutive_losses = self.state.consecutive_losses,
            "trade closed"
        );

        if self.state.trading_locked {
            return None;
        }

        let reason = if self.state.daily_pnl <= -self.config.max_daily_loss {
            Some(LockReason::DailyLossLimit)
        } else if self.state.consecutive_losses >= self.config.max_consecutive_losses {
            Some(LockReason::LossStreak)
        } else {
            None
        };

        if let Some(reason) = reason {
            self.state.trading_locked = true;
            self.state.lock_reason = Some(reason);
            warn!(%reason, daily_pnl = self.state.daily_pnl, "trading locked until next session");
        }
        reason
    }

    /// Session rollover: clears daily P&L, the loss streak and any lock.
    /// The last trade time survives so the cooldown spans midnight.
    pub fn on_new_day(&mut self) {
        if self.state.trading_locked {
            info!(reason = ?self.state.lock_reason, "new day: clearing risk lock");
        }
        self.state.daily_pnl = 0.0;
        self.state.consecutive_losses = 0;
        self.state.trading_locked = false;
        self.state.lock_reason = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    fn governor(max_daily_loss: f64, streak: u32, cooldown_secs: i64) -> RiskGovernor {
        RiskGovernor::new(
            RiskConfig {
                risk_pct: 0.01,
                max_daily_loss,
                max_consecutive_losses: streak,
                cooldown_secs,
            },
            InstrumentSpec::default(),
        )
    }

    #[test]
    fn fresh_governor_allows_entry() {
        let g = governor(100.0, 3, 60);
        assert!(g.can_enter(at(9, 0, 0)));
        assert_eq!(g.state(), &RiskState::default());
    }

    #[test]
    fn daily_loss_locks_until_new_day() {
        let mut g = governor(100.0, 5, 0);
        assert_eq!(g.on_trade_closed(-60.0, at(9, 0, 0)), None);
        assert!(g.can_enter(at(9, 1, 0)));
        assert_eq!(g.on_trade_closed(-50.0, at(9, 5, 0)), Some(LockReason::DailyLossLimit));
        assert!(!g.can_enter(at(9, 6, 0)));
        assert!(!g.can_enter(at(23, 59, 0)));
        assert_eq!(
            g.entry_verdict(at(10, 0, 0)).block,
            Some(RiskBlock::Locked { reason: LockReason::DailyLossLimit })
        );

        g.on_new_day();
        assert!(g.can_enter(at(23, 59, 30)));
        assert_eq!(g.state().daily_pnl, 0.0);
    }

    #[test]
    fn loss_streak_locks_and_win_resets() {
        let mut g = governor(10_000.0, 3, 0);
        g.on_trade_closed(-1.0, at(9, 0, 0));
        g.on_trade_closed(-1.0, at(9, 1, 0));
        g.on_trade_closed(5.0, at(9, 2, 0));
        assert_eq!(g.state().consecutive_losses, 0);

        g.on_trade_closed(-1.0, at(9, 3, 0));
        g.on_trade_closed(-1.0, at(9, 4, 0));
        assert!(g.can_enter(at(9, 5, 0)));
        assert_eq!(g.on_trade_closed(-1.0, at(9, 5, 0)), Some(LockReason::LossStreak));
        assert!(!g.can_enter(at(9, 6, 0)));
        assert_eq!(g.state().lock_reason, Some(LockReason::LossStreak));
    }

    #[test]
    fn breakeven_leaves_streak_unchanged() {
        let mut g = governor(10_000.0, 3, 0);
        g.on_trade_closed(-1.0, at(9, 0, 0));
        g.on_trade_closed(0.0, at(9, 1, 0));
        assert_eq!(g.state().consecutive_losses, 1);
    }

    #[test]
    fn lock_reason_is_sticky() {
        let mut g = governor(100.0, 2, 0);
        g.on_trade_closed(-150.0, at(9, 0, 0));
        // second loss would also trip the streak; the first reason stays
        assert_eq!(g.on_trade_closed(-1.0, at(9, 1, 0)), None);
        assert_eq!(g.state().lock_reason, Some(LockReason::DailyLossLimit));
    }

    #[test]
    fn cooldown_blocks_then_expires() {
        let mut g = governor(1_000.0, 5, 180);
        g.on_trade_closed(10.0, at(9, 0, 0));
        assert_eq!(
            g.entry_verdict(at(9, 1, 0)).block,
            Some(RiskBlock::Cooldown { remaining_secs: 120 })
        );
        assert!(!g.can_enter(at(9, 2, 59)));
        assert!(g.can_enter(at(9, 3, 0)));
    }

    #[test]
    fn cooldown_survives_new_day() {
        let mut g = governor(1_000.0, 5, 600);
        g.on_trade_closed(10.0, at(9, 0, 0));
        g.on_new_day();
        assert!(!g.can_enter(at(9, 5, 0)));
    }

    #[test]
    fn breaker_counts_floating_loss() {
        let mut g = governor(100.0, 5, 0);
        g.on_trade_closed(-40.0, at(9, 0, 0));
        assert!(!g.breaker_tripped(-59.0));
        assert!(g.breaker_tripped(-60.0));
        // query only
        assert!(!g.is_locked());
    }

    #[test]
    fn position_size_uses_instrument_rules() {
        let g = governor(100.0, 3, 0);
        assert_eq!(g.position_size(10_000.0, 0.01, 5.0, 1.0, 0.1), Ok(2.0));
        assert!(g.position_size(10_000.0, 0.01, 0.0, 1.0, 0.1).is_err());
    }

    #[test]
    fn lock_reason_display() {
        assert_eq!(LockReason::DailyLossLimit.to_string(), "daily_loss_limit");
        assert_eq!(LockReason::LossStreak.to_string(), "loss_streak");
    }
}
