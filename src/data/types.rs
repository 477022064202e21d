//! Wire-level value types exchanged with the broker and market-data collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Lots, Pips};
use crate::domain::OrderSide;

/// A top-of-book quote for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    pub spread_pips: Pips,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct AccountInfo {
    pub balance: f64,
    pub equity: f64,
    pub used_margin: f64,
    /// Percent. Zero means the broker did not report one.
    pub margin_level: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    pub symbol: String,
    pub side: OrderSide,
    pub volume: Lots,
    pub entry_price: f64,
}

/// Per-symbol lot constraints supplied by the broker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub pip_size: f64,
    pub min_lot: Lots,
    pub lot_step: Lots,
}

impl Default for SymbolInfo {
    fn default() -> Self {
        Self {
            pip_size: 0.0001,
            min_lot: Lots::new(0.01),
            lot_step: Lots::new(0.01),
        }
    }
}

/// A fully sized market order, ready for submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub volume: Lots,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub client_tag: String,
}

/// Broker acknowledgement of a submitted order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub volume: Lots,
    pub executed_at: DateTime<Utc>,
}

/// Read-only view of current broker-side exposure.
/// The core never mutates this except via [`OrderRequest`] submission.
#[derive(Debug, Clone, Default)]
pub struct Exposure {
    positions: Vec<OpenPosition>,
}

impl Exposure {
    pub fn new(positions: Vec<OpenPosition>) -> Self {
        Self { positions }
    }

    pub fn total(&self) -> usize {
        self.positions.len()
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.positions.iter().any(|p| p.symbol == symbol)
    }

    /// Folds a just-executed order into the view so later gate checks in the
    /// same cycle see it without a broker round trip.
    pub fn push(&mut self, position: OpenPosition) {
        self.positions.push(position);
    }
}
