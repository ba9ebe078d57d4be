//! Session journal — JSONL append-only audit log.
//!
//! One JSON object per line: session start (with the config fingerprint),
//! actionable intents, fills, order failures, rejected samples, day
//! rollovers and the closing summary. Idle `None` intents are skipped unless
//! the filter asks for them, so a long replay does not bury the trades.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use meanrev_core::{FillOutcome, TradeIntent};

use crate::session::SessionSummary;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("journal serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JournalEvent {
    SessionStart {
        fingerprint: String,
        symbol: String,
        dry_run: bool,
    },
    Intent {
        intent: TradeIntent,
    },
    Fill {
        outcome: FillOutcome,
        fill_price: f64,
    },
    OrderFailed {
        reason: String,
    },
    SampleRejected {
        reason: String,
    },
    NewDay {
        date: NaiveDate,
    },
    SessionEnd {
        summary: SessionSummary,
    },
}

/// A journal line: event plus the sample time it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub at: Option<NaiveDateTime>,
    #[serde(flatten)]
    pub event: JournalEvent,
}

/// Which events are persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalFilter {
    /// Also write `None` intents (warm-up, no signal, holding, blocks).
    pub include_idle: bool,
}

impl JournalFilter {
    pub fn should_write(&self, event: &JournalEvent) -> bool {
        match event {
            JournalEvent::Intent { intent } => self.include_idle || !intent.is_none(),
            _ => true,
        }
    }
}

/// JSONL journal file manager.
pub struct Journal {
    path: PathBuf,
    filter: JournalFilter,
}

impl Journal {
    pub fn new(path: PathBuf, filter: JournalFilter) -> Self {
        Self { path, filter }
    }

    /// Append an event if it passes the filter.
    ///
    /// Returns `Ok(true)` if the entry was written, `Ok(false)` if filtered out.
    pub fn append(
        &self,
        at: Option<NaiveDateTime>,
        event: JournalEvent,
    ) -> Result<bool, JournalError> {
        if !self.filter.should_write(&event) {
            return Ok(false);
        }

        let json = serde_json::to_string(&JournalEntry { at, event })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(file, "{json}")?;
        file.flush()?;

        Ok(true)
    }

    /// Read all entries from the journal file, skipping malformed lines.
    pub fn read_all(&self) -> Result<Vec<JournalEntry>, JournalError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.path)?;
        let reader = io::BufReader::new(file);
        let mut entries = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(entry) = serde_json::from_str::<JournalEntry>(&line) {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
