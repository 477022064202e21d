//! Configuration module for the trading engine.

mod settings;
mod types;

// Public
pub mod constants;

// Re-export commonly used items
pub use settings::Settings;
pub use types::{Confidence, Lots, Pips, RiskPct, RiskReward};
