// Indicator math and snapshot assembly
mod indicators;
mod snapshot;

pub use indicators::{
    IndicatorSet, atr, bollinger_bands, compute_indicators, ema, ema_series, macd, rsi, sma,
    support_resistance,
};
pub use snapshot::{MarketSnapshot, SnapshotBuilder};
