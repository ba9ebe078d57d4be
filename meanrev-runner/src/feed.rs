//! Price sample sources for replay.
//!
//! Two sources:
//! 1. CSV file with header `timestamp,price,spread,tick_value,tick_size`
//!    (`timestamp` as `YYYY-MM-DDTHH:MM:SS`)
//! 2. Seeded synthetic mean-reverting (Ornstein-Uhlenbeck) path
//!
//! Rows are returned as-is: validation and ordering are the engine's job, so
//! a bad row in a file shows up as a rejected sample rather than a load error.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use thiserror::Error;

use meanrev_core::PriceSample;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("malformed CSV row {row}: {source}")]
    Row { row: usize, source: csv::Error },

    #[error("CSV contains no samples")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: NaiveDateTime,
    price: f64,
    spread: f64,
    tick_value: f64,
    tick_size: f64,
}

impl From<CsvRow> for PriceSample {
    fn from(r: CsvRow) -> Self {
        PriceSample::new(r.timestamp, r.price, r.spread, r.tick_value, r.tick_size)
    }
}

/// Read samples from any CSV source.
pub fn read_csv<R: io::Read>(reader: R) -> Result<Vec<PriceSample>, FeedError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut samples = Vec::new();
    for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
        // header is line 1
        let row = row.map_err(|source| FeedError::Row { row: i + 2, source })?;
        samples.push(row.into());
    }
    if samples.is_empty() {
        return Err(FeedError::Empty);
    }
    Ok(samples)
}

pub fn load_csv(path: &Path) -> Result<Vec<PriceSample>, FeedError> {
    let file = std::fs::File::open(path).map_err(|source| FeedError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(io::BufReader::new(file))
}

/// Parameters for a synthetic Ornstein-Uhlenbeck price path.
///
/// Each step: `price += theta * (mean - price) + sigma * u`, `u ~ U(-1, 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticFeed {
    pub seed: u64,
    pub start: NaiveDateTime,
    pub step: Duration,
    pub mean: f64,
    pub theta: f64,
    pub sigma: f64,
    pub spread: f64,
    pub tick_value: f64,
    pub tick_size: f64,
}

impl SyntheticFeed {
    /// FX-like defaults: 1-minute bars around 1.1000.
    pub fn new(seed: u64, start: NaiveDateTime) -> Self {
        Self {
            seed,
            start,
            step: Duration::minutes(1),
            mean: 1.1,
            theta: 0.05,
            sigma: 0.0004,
            spread: 0.00008,
            tick_value: 1.0,
            tick_size: 0.00001,
        }
    }

    /// Generate `n` samples. The same seed always yields the same path.
    pub fn generate(&self, n: usize) -> Vec<PriceSample> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let floor = self.tick_size.max(f64::MIN_POSITIVE);
        let mut price = self.mean;
        let mut ts = self.start;

        let mut samples = Vec::with_capacity(n);
        for _ in 0..n {
            let shock: f64 = rng.gen_range(-1.0..1.0);
            price += self.theta * (self.mean - price) + self.sigma * shock;
            price = price.max(floor);

            // spread jitter of up to +50%
            let spread = self.spread * (1.0 + rng.gen_range(0.0..0.5));
            samples.push(PriceSample::new(
                ts,
                price,
                spread,
                self.tick_value,
                self.tick_size,
            ));
            ts += self.step;
        }
        samples
    }
}
