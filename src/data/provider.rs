use anyhow::Result;
use async_trait::async_trait;

use crate::data::Quote;
use crate::domain::{Candle, Timeframe};

/// Abstract interface for fetching market data.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Current top-of-book quote for a symbol.
    async fn get_quote(&self, symbol: &str) -> Result<Quote>;

    /// Historical candles ordered oldest→newest, at most `count` of them.
    async fn get_history(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Candle>>;
}
