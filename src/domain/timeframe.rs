use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Candle resolutions the bot requests history for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    Default,
)]
pub enum Timeframe {
    M1,
    M5,
    #[default]
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    pub fn duration(&self) -> Duration {
        match self {
            Self::M1 => Duration::from_secs(60),
            Self::M5 => Duration::from_secs(5 * 60),
            Self::M15 => Duration::from_secs(15 * 60),
            Self::M30 => Duration::from_secs(30 * 60),
            Self::H1 => Duration::from_secs(60 * 60),
            Self::H4 => Duration::from_secs(4 * 60 * 60),
            Self::D1 => Duration::from_secs(24 * 60 * 60),
        }
    }
}
