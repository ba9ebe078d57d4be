//! MeanRev Runner — host-side collaborators for the decision core.
//!
//! This crate builds on `meanrev-core` to provide:
//! - TOML agent configuration with a BLAKE3 fingerprint
//! - Price feeds (CSV replay, seeded synthetic mean-reverting path)
//! - Execution sinks (dry-run paper fills, recording sink for tests)
//! - JSONL session journal
//! - Session driver with day rollover and a paper account

pub mod config;
pub mod feed;
pub mod journal;
pub mod session;
pub mod sink;

pub use config::{load_config, AccountConfig, AgentConfig, ConfigError, ExecutionConfig, JournalConfig};
pub use feed::{load_csv, read_csv, FeedError, SyntheticFeed};
pub use journal::{Journal, JournalEntry, JournalError, JournalEvent, JournalFilter};
pub use session::{PaperAccount, Session, SessionError, SessionSummary};
pub use sink::{DryRunSink, ExecutionSink, OrderDirection, OrderKind, OrderRequest, RecordingSink, SinkError};
