//! Deterministic in-memory collaborators for dry runs and tests. No network,
//! no persistence: a synthetic price path and a paper-trading broker.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::config::{Lots, Pips};
use crate::data::{
    AccountInfo, BrokerGateway, MarketDataSource, OpenPosition, OrderReceipt, OrderRequest, Quote,
    SymbolInfo,
};
use crate::domain::{Candle, Timeframe};

/// Synthetic market: a smooth oscillating price path seeded per symbol, so
/// every run over the same symbols replays the same candles.
pub struct SimMarket {
    base_price: f64,
}

impl SimMarket {
    pub fn new() -> Self {
        Self { base_price: 1.1000 }
    }

    fn price_at(&self, seed: u64, step: u64) -> f64 {
        // Two incommensurate sine waves give a non-repeating wiggle
        let t = step as f64;
        let phase = (seed % 97) as f64;
        self.base_price
            + 0.004 * ((t + phase) * 0.13).sin()
            + 0.0015 * ((t + phase) * 0.71).sin()
    }
}

impl Default for SimMarket {
    fn default() -> Self {
        Self::new()
    }
}

fn symbol_seed(symbol: &str) -> u64 {
    symbol.bytes().fold(0u64, |acc, b| {
        acc.wrapping_mul(31).wrapping_add(b as u64)
    })
}

#[async_trait]
impl MarketDataSource for SimMarket {
    async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        let seed = symbol_seed(symbol);
        let now = Utc::now();
        let step = (now.timestamp() / 60) as u64;
        let mid = self.price_at(seed, step);
        Ok(Quote {
            symbol: symbol.to_string(),
            bid: mid - 0.0001,
            ask: mid + 0.0001,
            spread_pips: Pips::new(2.0),
            timestamp: now,
        })
    }

    async fn get_history(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Candle>> {
        let seed = symbol_seed(symbol).wrapping_add(timeframe as u64);
        let interval_ms = timeframe.duration().as_millis() as i64;
        let now_ms = Utc::now().timestamp_millis();

        let candles = (0..count)
            .map(|i| {
                let step = i as u64;
                let open = self.price_at(seed, step);
                let close = self.price_at(seed, step + 1);
                let high = open.max(close) + 0.0003;
                let low = open.min(close) - 0.0003;
                let ts = now_ms - (count as i64 - i as i64) * interval_ms;
                Candle::new(ts, open, high, low, close, 1000.0)
            })
            .collect();
        Ok(candles)
    }
}

/// Paper broker: fixed demo account, positions held in memory.
pub struct PaperBroker {
    account: AccountInfo,
    positions: Mutex<Vec<OpenPosition>>,
}

impl PaperBroker {
    pub fn new(balance: f64) -> Self {
        Self {
            account: AccountInfo {
                balance,
                equity: balance,
                used_margin: 0.0,
                margin_level: 0.0,
            },
            positions: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BrokerGateway for PaperBroker {
    async fn get_account(&self) -> Result<AccountInfo> {
        Ok(self.account)
    }

    async fn get_open_positions(&self) -> Result<Vec<OpenPosition>> {
        Ok(self.positions.lock().await.clone())
    }

    async fn get_symbol_info(&self, _symbol: &str) -> Result<SymbolInfo> {
        Ok(SymbolInfo {
            pip_size: 0.0001,
            min_lot: Lots::new(0.01),
            lot_step: Lots::new(0.01),
        })
    }

    async fn place_order(&self, order: OrderRequest) -> Result<OrderReceipt> {
        let receipt = OrderReceipt {
            order_id: order.client_tag.clone(),
            symbol: order.symbol.clone(),
            side: order.side,
            volume: order.volume,
            executed_at: Utc::now(),
        };
        self.positions.lock().await.push(OpenPosition {
            symbol: order.symbol,
            side: order.side,
            volume: order.volume,
            entry_price: 0.0,
        });
        Ok(receipt)
    }

    async fn close_all_positions(&self) -> Result<Vec<OpenPosition>> {
        Ok(std::mem::take(&mut *self.positions.lock().await))
    }
}
