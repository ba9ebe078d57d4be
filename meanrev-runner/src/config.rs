//! Agent configuration loaded from TOML.
//!
//! ```toml
//! [instrument]
//! symbol = "BTCUSDm"
//! volume_step = 0.01
//! volume_min = 0.01
//! volume_max = 5.0
//!
//! [strategy.signal]
//! window_size = 120
//! z_enter = 1.2
//! z_exit = 0.3
//!
//! [account]
//! starting_equity = 10000.0
//!
//! [execution]
//! dry_run = true
//! ```
//!
//! Every section except `[instrument]` falls back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use meanrev_core::{CoreConfig, InstrumentSpec};

/// Unique identifier for a configuration (content-addressable hash).
pub type ConfigFingerprint = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid strategy config: {0}")]
    Invalid(#[from] meanrev_core::ConfigError),

    #[error("invalid account: starting_equity must be positive and finite, got {0}")]
    InvalidEquity(f64),

    #[error("failed to fingerprint config: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Paper account settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub starting_equity: f64,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            starting_equity: 10_000.0,
        }
    }
}

/// Order routing settings, stamped onto every order request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Log orders and simulate fills instead of routing to a broker.
    pub dry_run: bool,
    /// Identifier tagging this agent's orders at the broker.
    pub magic: u64,
    /// Maximum accepted slippage, in points.
    pub deviation: u32,
    pub comment: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            magic: 777_001,
            deviation: 20,
            comment: "meanrev_safe".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalConfig {
    /// JSONL audit log; disabled when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Also journal idle `None` intents.
    #[serde(default)]
    pub include_idle: bool,
}

/// Complete agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub instrument: InstrumentSpec,
    #[serde(default)]
    pub strategy: CoreConfig,
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub journal: JournalConfig,
}

impl AgentConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AgentConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy.validate()?;
        self.instrument.validate().map_err(meanrev_core::ConfigError::from)?;
        let equity = self.account.starting_equity;
        if !(equity.is_finite() && equity > 0.0) {
            return Err(ConfigError::InvalidEquity(equity));
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash of the canonical JSON form.
    ///
    /// Two sessions with identical configs share a fingerprint, so journal
    /// entries can be matched to the exact parameters that produced them.
    pub fn fingerprint(&self) -> Result<ConfigFingerprint, ConfigError> {
        let json = serde_json::to_string(self)?;
        let hash = blake3::hash(json.as_bytes());
        Ok(hash.to_hex().to_string())
    }
}

/// Read, parse and validate a TOML config file.
pub fn load_config(path: &Path) -> Result<AgentConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    AgentConfig::from_toml(&content)
}
