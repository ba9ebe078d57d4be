//! Time-of-day windows for the trading session and blackouts.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Half-open time-of-day window `[start, end)`.
///
/// A window whose `start` is after its `end` wraps midnight
/// (e.g. 22:00–02:00). `start == end` covers the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Build from whole hours/minutes. Returns `None` for out-of-range values.
    pub fn from_hm(start: (u32, u32), end: (u32, u32)) -> Option<Self> {
        Some(Self {
            start: NaiveTime::from_hms_opt(start.0, start.1, 0)?,
            end: NaiveTime::from_hms_opt(end.0, end.1, 0)?,
        })
    }

    pub fn all_day() -> Self {
        Self {
            start: NaiveTime::MIN,
            end: NaiveTime::MIN,
        }
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start == self.end {
            true
        } else if self.start < self.end {
            self.start <= t && t < self.end
        } else {
            t >= self.start || t < self.end
        }
    }
}

/// A named window during which no new entries are taken (e.g. daily rollover).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blackout {
    pub name: String,
    #[serde(flatten)]
    pub window: TimeWindow,
}

impl Blackout {
    pub fn new(name: impl Into<String>, window: TimeWindow) -> Self {
        Self { name: name.into(), window }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn plain_window_is_half_open() {
        let w = TimeWindow::from_hm((8, 0), (22, 0)).unwrap();
        assert!(w.contains(t(8, 0)));
        assert!(w.contains(t(21, 59)));
        assert!(!w.contains(t(22, 0)));
        assert!(!w.contains(t(7, 59)));
    }

    #[test]
    fn wrapping_window() {
        let w = TimeWindow::from_hm((22, 0), (2, 0)).unwrap();
        assert!(w.wraps_midnight());
        assert!(w.contains(t(23, 30)));
        assert!(w.contains(t(0, 15)));
        assert!(!w.contains(t(2, 0)));
        assert!(!w.contains(t(12, 0)));
    }

    #[test]
    fn equal_bounds_cover_whole_day() {
        let w = TimeWindow::all_day();
        assert!(w.contains(t(0, 0)));
        assert!(w.contains(t(23, 59)));
    }

    #[test]
    fn from_hm_rejects_bad_hour() {
        assert!(TimeWindow::from_hm((25, 0), (1, 0)).is_none());
    }
}
