//! Per-symbol evaluation input: one quote + multi-timeframe indicators +
//! session/volatility classification, assembled once per cycle.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::analysis::{IndicatorSet, compute_indicators};
use crate::config::Pips;
use crate::config::constants::HISTORY_CANDLES;
use crate::data::{MarketDataSource, Quote};
use crate::domain::{Timeframe, TradingSession, VolatilityLevel};

/// Everything the oracle and the signal gate see about a symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    pub spread_pips: Pips,
    /// Mid price. Zero on the sentinel snapshot.
    pub current_price: f64,
    pub session: TradingSession,
    pub volatility: VolatilityLevel,
    pub timeframes: BTreeMap<Timeframe, IndicatorSet>,
    pub timestamp: DateTime<Utc>,
    /// Set when the quote fetch failed; callers must not evaluate then.
    pub quote_error: Option<String>,
}

impl MarketSnapshot {
    /// The "do not evaluate" snapshot produced when quote data is unavailable.
    pub fn sentinel(symbol: &str, error: String, now: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_string(),
            bid: 0.0,
            ask: 0.0,
            spread_pips: Pips::new(0.0),
            current_price: 0.0,
            session: TradingSession::from_utc_hour(now.hour()),
            volatility: VolatilityLevel::Normal,
            timeframes: BTreeMap::new(),
            timestamp: now,
            quote_error: Some(error),
        }
    }

    pub fn is_evaluable(&self) -> bool {
        self.quote_error.is_none() && self.current_price > 0.0
    }
}

/// Average RSI_14 across whichever timeframes produced one.
fn avg_rsi(timeframes: &BTreeMap<Timeframe, IndicatorSet>) -> Option<f64> {
    let values: Vec<f64> = timeframes
        .values()
        .filter_map(|set| set.get("RSI_14"))
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Fetches and assembles [`MarketSnapshot`]s.
pub struct SnapshotBuilder {
    source: Arc<dyn MarketDataSource>,
    timeframes: Vec<Timeframe>,
}

impl SnapshotBuilder {
    pub fn new(source: Arc<dyn MarketDataSource>, timeframes: Vec<Timeframe>) -> Self {
        Self { source, timeframes }
    }

    /// Builds the snapshot for one symbol. A failed quote yields the sentinel;
    /// a failed timeframe history is skipped, the rest still contribute.
    pub async fn build(&self, symbol: &str) -> MarketSnapshot {
        let now = Utc::now();

        let quote = match self.source.get_quote(symbol).await {
            Ok(q) => q,
            Err(e) => {
                warn!("No quote for {symbol}: {e:#}");
                return MarketSnapshot::sentinel(symbol, format!("{e:#}"), now);
            }
        };

        let mut timeframes = BTreeMap::new();
        for tf in &self.timeframes {
            match self.source.get_history(symbol, *tf, HISTORY_CANDLES).await {
                Ok(candles) => {
                    timeframes.insert(*tf, compute_indicators(&candles));
                }
                Err(e) => {
                    warn!("Could not get {tf} history for {symbol}: {e:#}");
                }
            }
        }

        Self::assemble(symbol, &quote, timeframes, now)
    }

    /// Pure assembly step, split out so classification is testable without I/O.
    pub fn assemble(
        symbol: &str,
        quote: &Quote,
        timeframes: BTreeMap<Timeframe, IndicatorSet>,
        now: DateTime<Utc>,
    ) -> MarketSnapshot {
        let volatility = VolatilityLevel::from_avg_rsi(avg_rsi(&timeframes));
        MarketSnapshot {
            symbol: symbol.to_string(),
            bid: quote.bid,
            ask: quote.ask,
            spread_pips: quote.spread_pips,
            current_price: quote.mid(),
            session: TradingSession::from_utc_hour(now.hour()),
            volatility,
            timeframes,
            timestamp: now,
            quote_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use crate::domain::Candle;

    fn quote(symbol: &str) -> Quote {
        Quote {
            symbol: symbol.into(),
            bid: 1.1000,
            ask: 1.1002,
            spread_pips: Pips::new(2.0),
            timestamp: Utc::now(),
        }
    }

    fn rsi_only_set(rsi: f64) -> IndicatorSet {
        let mut set = IndicatorSet::new();
        set.insert("RSI_14", rsi);
        set
    }

    #[test]
    fn sentinel_is_not_evaluable() {
        let snap = MarketSnapshot::sentinel("EURUSD", "timeout".into(), Utc::now());
        assert_eq!(snap.current_price, 0.0);
        assert!(snap.quote_error.is_some());
        assert!(!snap.is_evaluable());
    }

    #[test]
    fn assemble_classifies_volatility_from_average_rsi() {
        let mut tfs = BTreeMap::new();
        tfs.insert(Timeframe::M5, rsi_only_set(80.0));
        tfs.insert(Timeframe::H1, rsi_only_set(70.0));
        // avg = 75 → High
        let snap = SnapshotBuilder::assemble("EURUSD", &quote("EURUSD"), tfs, Utc::now());
        assert_eq!(snap.volatility, VolatilityLevel::High);
        assert!(snap.is_evaluable());
        assert!((snap.current_price - 1.1001).abs() < 1e-12);
    }

    #[test]
    fn assemble_defaults_volatility_without_rsi() {
        let snap =
            SnapshotBuilder::assemble("EURUSD", &quote("EURUSD"), BTreeMap::new(), Utc::now());
        assert_eq!(snap.volatility, VolatilityLevel::Normal);
    }

    struct FlakyHistorySource;

    #[async_trait]
    impl MarketDataSource for FlakyHistorySource {
        async fn get_quote(&self, symbol: &str) -> Result<Quote> {
            Ok(quote(symbol))
        }

        async fn get_history(
            &self,
            _symbol: &str,
            timeframe: Timeframe,
            count: usize,
        ) -> Result<Vec<Candle>> {
            if timeframe == Timeframe::H1 {
                bail!("simulated timeout");
            }
            Ok((0..count)
                .map(|i| Candle::new(i as i64 * 60_000, 1.1, 1.101, 1.099, 1.1, 50.0))
                .collect())
        }
    }

    #[tokio::test]
    async fn partial_timeframe_failure_keeps_the_rest() {
        let builder = SnapshotBuilder::new(
            Arc::new(FlakyHistorySource),
            vec![Timeframe::M5, Timeframe::H1],
        );
        let snap = builder.build("EURUSD").await;
        assert!(snap.is_evaluable());
        assert!(snap.timeframes.contains_key(&Timeframe::M5));
        assert!(!snap.timeframes.contains_key(&Timeframe::H1));
    }

    struct DeadSource;

    #[async_trait]
    impl MarketDataSource for DeadSource {
        async fn get_quote(&self, _symbol: &str) -> Result<Quote> {
            bail!("connection refused");
        }

        async fn get_history(
            &self,
            _symbol: &str,
            _timeframe: Timeframe,
            _count: usize,
        ) -> Result<Vec<Candle>> {
            bail!("connection refused");
        }
    }

    #[tokio::test]
    async fn quote_failure_produces_the_sentinel() {
        let builder = SnapshotBuilder::new(Arc::new(DeadSource), vec![Timeframe::M5]);
        let snap = builder.build("EURUSD").await;
        assert!(!snap.is_evaluable());
        assert!(snap.quote_error.unwrap().contains("connection refused"));
    }
}
