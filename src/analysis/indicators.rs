//! Pure indicator math over ordered candle history (most-recent-last).
//!
//! Every function here is stateless. Outputs land in an [`IndicatorSet`];
//! non-finite values are dropped at insertion so "indicator absent" is an
//! explicit missing key, never a NaN smuggled downstream.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::config::constants::MIN_INDICATOR_HISTORY;
use crate::domain::Candle;

/// Named indicator values for one timeframe, produced fresh per cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorSet(BTreeMap<String, f64>);

impl IndicatorSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Inserts a value, silently dropping NaN/infinite results.
    pub fn insert(&mut self, name: &str, value: f64) {
        if value.is_finite() {
            self.0.insert(name.to_string(), value);
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }
}

/// Computes the full indicator set for one timeframe's history.
/// Histories shorter than the minimum return an empty set, not an error.
pub fn compute_indicators(candles: &[Candle]) -> IndicatorSet {
    let mut set = IndicatorSet::new();
    if candles.len() < MIN_INDICATOR_HISTORY {
        return set;
    }

    // The original feed caps indicator input at the trailing 50 candles.
    let window = &candles[candles.len().saturating_sub(50)..];
    let closes: Vec<f64> = window.iter().map(|c| c.close).collect();

    set.insert("SMA_20", sma(&closes, 20));
    if closes.len() >= 50 {
        set.insert("SMA_50", sma(&closes, 50));
    }
    set.insert("EMA_20", ema(&closes, 20));
    set.insert("RSI_14", rsi(&closes, 14));

    if closes.len() >= 26 {
        let (line, signal) = macd(&closes);
        set.insert("MACD_Line", line);
        set.insert("MACD_Signal", signal);
        set.insert("MACD_Histogram", line - signal);
    }

    let (upper, middle, lower) = bollinger_bands(&closes, 20, 2.0);
    set.insert("BB_Upper", upper);
    set.insert("BB_Middle", middle);
    set.insert("BB_Lower", lower);

    let (support, resistance) = support_resistance(window, 20);
    set.insert("Support", support);
    set.insert("Resistance", resistance);

    set.insert("ATR_14", atr(window, 14));

    set
}

/// Arithmetic mean of the last `n` values.
pub fn sma(values: &[f64], n: usize) -> f64 {
    if values.len() < n || n == 0 {
        return f64::NAN;
    }
    let tail = &values[values.len() - n..];
    tail.iter().sum::<f64>() / n as f64
}

/// EMA seeded with the first value in the window, k = 2/(n+1).
pub fn ema(values: &[f64], n: usize) -> f64 {
    *ema_series(values, n).last().unwrap_or(&f64::NAN)
}

/// Full EMA series (one value per input index), seeded with values[0].
pub fn ema_series(values: &[f64], n: usize) -> Vec<f64> {
    if values.is_empty() || n == 0 {
        return Vec::new();
    }
    let k = 2.0 / (n as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut current = values[0];
    out.push(current);
    for &price in &values[1..] {
        current += (price - current) * k;
        out.push(current);
    }
    out
}

/// RSI over the last `period` deltas, simple-average convention.
/// Fewer than period+1 closes → neutral 50. No losses at all → 100.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return 50.0;
    }

    let deltas: Vec<f64> = closes
        .iter()
        .tuple_windows()
        .map(|(prev, next)| next - prev)
        .collect();
    let tail = &deltas[deltas.len() - period..];

    let avg_gain: f64 = tail.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
    let avg_loss: f64 = -tail.iter().filter(|d| **d < 0.0).sum::<f64>() / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// MACD line (EMA12 − EMA26) and its signal line.
///
/// The signal is a proper rolling EMA(9) of the per-index MACD-line series.
/// Some feeds approximate it from the latest line value alone, which collapses
/// the crossover information the histogram exists to expose.
pub fn macd(closes: &[f64]) -> (f64, f64) {
    if closes.len() < 26 {
        return (f64::NAN, f64::NAN);
    }

    let ema12 = ema_series(closes, 12);
    let ema26 = ema_series(closes, 26);
    let line: Vec<f64> = ema12
        .iter()
        .zip(ema26.iter())
        .map(|(fast, slow)| fast - slow)
        .collect();

    let signal = *ema_series(&line, 9).last().unwrap_or(&f64::NAN);
    (*line.last().unwrap_or(&f64::NAN), signal)
}

/// SMA(period) ± mult × population stddev over the same window.
pub fn bollinger_bands(closes: &[f64], period: usize, mult: f64) -> (f64, f64, f64) {
    if closes.len() < period || period == 0 {
        return (f64::NAN, f64::NAN, f64::NAN);
    }
    let tail = &closes[closes.len() - period..];
    let mean = tail.iter().sum::<f64>() / period as f64;
    let variance = tail.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / period as f64;
    let std = variance.sqrt();

    (mean + mult * std, mean, mean - mult * std)
}

/// (min low, max high) over the trailing `window` candles.
pub fn support_resistance(candles: &[Candle], window: usize) -> (f64, f64) {
    if candles.len() < window || window == 0 {
        return (f64::NAN, f64::NAN);
    }
    let tail = &candles[candles.len() - window..];
    let support = tail.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let resistance = tail.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    (support, resistance)
}

/// Mean true range over the trailing `period` candles.
pub fn atr(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() < period + 1 {
        return f64::NAN;
    }
    let start = candles.len() - period;
    let sum: f64 = (start..candles.len())
        .map(|i| candles[i].true_range(candles[i - 1].close))
        .sum();
    sum / period as f64
}
