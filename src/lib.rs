#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::too_many_arguments)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod notify;
pub mod oracle;

// Re-export commonly used types outside of crate
pub use analysis::{IndicatorSet, MarketSnapshot, SnapshotBuilder};
pub use config::Settings;
pub use engine::{RiskMode, Trader};
pub use oracle::Signal;

// CLI argument parsing
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Evaluate signals but never submit orders
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Override SCAN_INTERVAL (seconds between evaluation cycles)
    #[arg(long)]
    pub scan_interval: Option<u64>,
}
