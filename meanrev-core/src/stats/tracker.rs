use serde::{Deserialize, Serialize};

use super::rolling::{RollingStats, RollingWindow};
use crate::domain::PriceSample;

/// Z-score of the latest price against the rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum ZScore {
    /// Window not yet full: no trade decision is possible.
    Unavailable,
    Ready(f64),
}

impl ZScore {
    pub fn value(self) -> Option<f64> {
        match self {
            ZScore::Ready(z) => Some(z),
            ZScore::Unavailable => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, ZScore::Ready(_))
    }
}

/// Everything downstream components need from one statistics update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatReading {
    pub zscore: ZScore,
    /// Rolling standard deviation in price units.
    pub volatility: f64,
    pub mean: f64,
}

/// Rolling mean / stdev tracker emitting a Z-score per accepted price.
#[derive(Debug, Clone)]
pub struct StatTracker {
    window: RollingWindow,
    epsilon: f64,
}

impl StatTracker {
    pub fn new(window_size: usize, epsilon: f64) -> Self {
        assert!(window_size >= 2, "window_size must be >= 2");
        assert!(epsilon > 0.0, "epsilon must be > 0");
        Self {
            window: RollingWindow::new(window_size),
            epsilon,
        }
    }

    pub fn update(&mut self, sample: &PriceSample) -> StatReading {
        self.update_price(sample.price)
    }

    /// Push a raw price. The caller is responsible for having validated it.
    pub fn update_price(&mut self, price: f64) -> StatReading {
        self.window.push(price);

        let mean = self.window.mean();
        let stdev = self.window.stdev();
        let zscore = if self.window.is_full() {
            ZScore::Ready((price - mean) / stdev.max(self.epsilon))
        } else {
            ZScore::Unavailable
        };

        StatReading { zscore, volatility: stdev, mean }
    }

    /// Current volatility estimate (rolling stdev).
    pub fn volatility(&self) -> f64 {
        self.window.stdev()
    }

    pub fn is_warm(&self) -> bool {
        self.window.is_full()
    }

    pub fn stats(&self) -> RollingStats {
        self.window.stats()
    }
}
