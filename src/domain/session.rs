use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Coarse UTC time-of-day bucket characterizing typical market liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum TradingSession {
    Asian,
    European,
    American,
}

impl TradingSession {
    /// Total over all 24 hours; buckets must never overlap.
    pub fn from_utc_hour(hour: u32) -> Self {
        match hour % 24 {
            0..=6 => Self::Asian,
            7..=14 => Self::European,
            15..=21 => Self::American,
            _ => Self::Asian, // 22-23: late rollover back into Asia
        }
    }
}

/// Market temperature derived from cross-timeframe RSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
pub enum VolatilityLevel {
    Low,
    Medium,
    High,
    #[default]
    Normal,
}

impl VolatilityLevel {
    /// Classifies the average RSI across timeframes. No RSI at all → Normal.
    pub fn from_avg_rsi(avg_rsi: Option<f64>) -> Self {
        match avg_rsi {
            Some(rsi) if rsi > 70.0 || rsi < 30.0 => Self::High,
            Some(rsi) if rsi > 60.0 || rsi < 40.0 => Self::Medium,
            Some(_) => Self::Low,
            None => Self::Normal,
        }
    }
}
