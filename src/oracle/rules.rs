//! A built-in rule oracle for dry runs. Emits the same raw JSON shape a
//! remote model would, so the validation boundary is exercised end to end.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::analysis::MarketSnapshot;
use crate::oracle::SignalOracle;

const STOP_DISTANCE: f64 = 0.0020;
const TARGET_DISTANCE: f64 = 0.0040;

/// RSI mean reversion on the lowest configured timeframe: buy oversold,
/// sell overbought, hold otherwise.
pub struct RuleOracle {
    oversold: f64,
    overbought: f64,
}

impl RuleOracle {
    pub fn new() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

impl Default for RuleOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalOracle for RuleOracle {
    async fn recommend(&self, snapshot: &MarketSnapshot) -> Result<Value> {
        let rsi = snapshot
            .timeframes
            .iter()
            .next()
            .and_then(|(_, set)| set.get("RSI_14"));

        let price = snapshot.current_price;
        let (action, confidence, reasoning) = match rsi {
            Some(r) if r <= self.oversold => {
                ("BUY", 0.75, format!("RSI {r:.1} oversold"))
            }
            Some(r) if r >= self.overbought => {
                ("SELL", 0.75, format!("RSI {r:.1} overbought"))
            }
            Some(r) => ("HOLD", 0.3, format!("RSI {r:.1} neutral")),
            None => ("HOLD", 0.0, "no RSI available".to_string()),
        };

        let (stop_loss, take_profit) = match action {
            "BUY" => (price - STOP_DISTANCE, price + TARGET_DISTANCE),
            "SELL" => (price + STOP_DISTANCE, price - TARGET_DISTANCE),
            _ => (price, price),
        };

        Ok(json!({
            "signal": action,
            "confidence": confidence,
            "entry_price": price,
            "stop_loss": stop_loss,
            "take_profit": take_profit,
            "reasons": [reasoning],
        }))
    }
}
