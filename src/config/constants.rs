//! Fixed trading constants. Runtime-tunable knobs live in `Settings` instead.

use std::time::Duration;

/// One standard lot in base-currency units.
pub const STANDARD_LOT_SIZE: f64 = 100_000.0;

/// Candle history requested per timeframe for indicator work.
pub const HISTORY_CANDLES: usize = 100;

/// Indicators refuse to run on fewer candles than this.
pub const MIN_INDICATOR_HISTORY: usize = 20;

pub mod gate {
    use crate::config::Confidence;

    /// Oracle signals below this confidence are never acted on.
    pub const MIN_CONFIDENCE: Confidence = Confidence::new(0.70);
}

pub mod retry {
    use std::time::Duration;

    /// Attempts per collaborator call before the symbol's cycle is skipped.
    pub const MAX_ATTEMPTS: u32 = 3;
    pub const DELAY: Duration = Duration::from_millis(500);
}

pub mod failsafe {
    /// Equity below this is treated as a critical account condition.
    pub const MIN_EQUITY: f64 = 10.0;

    /// Win rate (%) below this raises a health warning.
    pub const LOW_WIN_RATE: f64 = 20.0;

    /// Daily PnL below this raises a health warning.
    pub const DAILY_PNL_FLOOR: f64 = -50.0;

    /// Margin level (%) below this skips the cycle. Zero means "not reported".
    pub const MIN_MARGIN_LEVEL: f64 = 200.0;
}

/// How long the scheduler sleeps when paused before re-checking mode.
pub const PAUSED_POLL_INTERVAL: Duration = Duration::from_secs(60);
