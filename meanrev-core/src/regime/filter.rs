//! Regime filter — gates new entries on volatility, spread and time of day.
//!
//! Stateless: the verdict depends only on the current inputs and static
//! configuration. A failing check blocks entries but never closes a position.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::session::{Blackout, TimeWindow};

/// Static regime thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// Maximum rolling stdev (price units) at which entries are allowed.
    pub max_volatility: f64,
    /// Maximum spread (price units) at which entries are allowed.
    pub max_spread: f64,
    pub session: TimeWindow,
    pub blackouts: Vec<Blackout>,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            max_volatility: f64::MAX,
            max_spread: f64::MAX,
            session: TimeWindow::all_day(),
            blackouts: Vec::new(),
        }
    }
}

/// The first reason an entry was blocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegimeBlock {
    Volatility { value: f64, max: f64 },
    Spread { value: f64, max: f64 },
    OutsideSession,
    Blackout { name: String },
}

/// Outcome of one regime evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeVerdict {
    pub volatility_ok: bool,
    pub spread_ok: bool,
    pub time_ok: bool,
    pub block: Option<RegimeBlock>,
}

impl RegimeVerdict {
    /// All three checks passed.
    pub fn is_clear(&self) -> bool {
        self.volatility_ok && self.spread_ok && self.time_ok
    }
}

/// Evaluate the regime for one tick.
pub fn evaluate(
    volatility: f64,
    spread: f64,
    timestamp: NaiveDateTime,
    config: &RegimeConfig,
) -> RegimeVerdict {
    let volatility_ok = volatility <= config.max_volatility;
    let spread_ok = spread <= config.max_spread;

    let time = timestamp.time();
    let in_session = config.session.contains(time);
    let blackout = config.blackouts.iter().find(|b| b.window.contains(time));
    let time_ok = in_session && blackout.is_none();

    let block = if !volatility_ok {
        Some(RegimeBlock::Volatility {
            value: volatility,
            max: config.max_volatility,
        })
    } else if !spread_ok {
        Some(RegimeBlock::Spread {
            value: spread,
            max: config.max_spread,
        })
    } else if !in_session {
        Some(RegimeBlock::OutsideSession)
    } else {
        blackout.map(|b| RegimeBlock::Blackout { name: b.name.clone() })
    };

    RegimeVerdict {
        volatility_ok,
        spread_ok,
        time_ok,
        block,
    }
}

/// Regime filter bound to its configuration.
#[derive(Debug, Clone)]
pub struct RegimeFilter {
    config: RegimeConfig,
}

impl RegimeFilter {
    pub fn new(config: RegimeConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, volatility: f64, spread: f64, timestamp: NaiveDateTime) -> RegimeVerdict {
        evaluate(volatility, spread, timestamp, &self.config)
    }

    pub fn config(&self) -> &RegimeConfig {
        &self.config
    }
}
