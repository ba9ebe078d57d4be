//! MeanRev CLI — replay and configuration commands.
//!
//! Commands:
//! - `replay` — drive the decision core over a CSV file or a synthetic path
//!   with dry-run execution, then print the session summary
//! - `check-config` — parse and validate a TOML config, print its fingerprint

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use tracing::Level;

use meanrev_runner::{load_config, load_csv, DryRunSink, Session, SessionSummary, SyntheticFeed};

#[derive(Parser)]
#[command(
    name = "meanrev",
    about = "MeanRev CLI — mean-reversion decision core replay"
)]
struct Cli {
    /// Log per-tick decisions.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(long, short, global = true, default_value_t = false)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay price samples through the decision core with dry-run execution.
    Replay {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// CSV of samples: timestamp,price,spread,tick_value,tick_size.
        #[arg(long, conflicts_with = "synthetic")]
        bars: Option<PathBuf>,

        /// Generate this many synthetic mean-reverting samples instead.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for the synthetic path.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Start time for the synthetic path (YYYY-MM-DDTHH:MM:SS).
        #[arg(long, default_value = "2024-01-02T00:00:00")]
        start: String,

        /// JSONL journal path (overrides the config file).
        #[arg(long)]
        journal: Option<PathBuf>,

        /// Leave any open position open at the end instead of flattening.
        #[arg(long, default_value_t = false)]
        no_flatten: bool,

        /// Print the summary as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Parse and validate a config file.
    CheckConfig {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Replay {
            config,
            bars,
            synthetic,
            seed,
            start,
            journal,
            no_flatten,
            json,
        } => run_replay(config, bars, synthetic, seed, &start, journal, !no_flatten, json),
        Commands::CheckConfig { config } => run_check_config(config),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_replay(
    config_path: PathBuf,
    bars: Option<PathBuf>,
    synthetic: Option<usize>,
    seed: u64,
    start: &str,
    journal: Option<PathBuf>,
    flatten: bool,
    json: bool,
) -> Result<()> {
    let mut config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    if !config.execution.dry_run {
        bail!("live execution needs a broker adapter; set [execution] dry_run = true to replay");
    }
    if let Some(path) = journal {
        config.journal.path = Some(path);
    }

    let samples = match (bars, synthetic) {
        (Some(path), None) => {
            load_csv(&path).with_context(|| format!("loading samples from {}", path.display()))?
        }
        (None, Some(n)) => {
            let start = NaiveDateTime::parse_from_str(start, "%Y-%m-%dT%H:%M:%S")
                .with_context(|| format!("invalid --start '{start}'"))?;
            SyntheticFeed::new(seed, start).generate(n)
        }
        (None, None) => bail!("one of --bars or --synthetic is required"),
        (Some(_), Some(_)) => bail!("--bars and --synthetic are mutually exclusive"),
    };

    let mut session = Session::new(&config, DryRunSink::new())?;
    for sample in &samples {
        session.step(sample)?;
    }
    let summary = session.finish(flatten)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&config.instrument.symbol, &summary);
    }
    if let Some(path) = &config.journal.path {
        println!("Journal written to: {}", path.display());
    }
    Ok(())
}

fn run_check_config(config_path: PathBuf) -> Result<()> {
    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let s = &config.strategy;

    println!("Config OK: {}", config_path.display());
    println!("Fingerprint:    {}", config.fingerprint()?);
    println!("Symbol:         {}", config.instrument.symbol);
    println!(
        "Signal:         window {} / enter {} / exit {}",
        s.signal.window_size, s.signal.z_enter, s.signal.z_exit
    );
    println!(
        "Risk:           {:.2}% per trade, max daily loss {}, {} losses, {}s cooldown",
        s.risk.risk_pct * 100.0,
        s.risk.max_daily_loss,
        s.risk.max_consecutive_losses,
        s.risk.cooldown_secs
    );
    println!(
        "Session:        {} to {} ({} blackouts)",
        s.regime.session.start,
        s.regime.session.end,
        s.regime.blackouts.len()
    );
    println!(
        "Execution:      {}",
        if config.execution.dry_run { "dry run" } else { "LIVE" }
    );
    Ok(())
}

fn print_summary(symbol: &str, summary: &SessionSummary) {
    println!();
    println!("=== Session Summary ===");
    println!("Symbol:         {symbol}");
    println!("Fingerprint:    {}", summary.fingerprint);
    println!(
        "Samples:        {} ({} rejected)",
        summary.samples_seen, summary.samples_rejected
    );
    println!("Days:           {}", summary.days);
    println!("Opens:          {}", summary.opens);
    println!("Trades closed:  {}", summary.trades_closed);
    println!("Orders failed:  {}", summary.orders_failed);
    println!("Lockouts:       {}", summary.lockouts);
    println!();
    println!("--- Performance ---");
    println!("Realized P&L:   {:.2}", summary.realized_pnl);
    println!("Final equity:   {:.2}", summary.final_equity);
    match summary.win_rate() {
        Some(rate) => println!("Win Rate:       {:.1}%", rate * 100.0),
        None => println!("Win Rate:       n/a"),
    }
    if !summary.open_position.is_flat() {
        println!("WARNING: {} position still open", summary.open_position);
    }
    println!();
    println!("--- Reasons ---");
    for (code, count) in &summary.reasons {
        println!("{code:<18} {count}");
    }
}
