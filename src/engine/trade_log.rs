//! In-memory record of executed trades and the performance summary the
//! failsafe reads. Durable storage is a collaborator concern, not ours.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Confidence, Lots};
use crate::domain::OrderSide;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub client_tag: String,
    pub symbol: String,
    pub side: OrderSide,
    pub volume: Lots,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub confidence: Confidence,
    pub reasons: Vec<String>,
    pub opened_at: DateTime<Utc>,
    pub status: TradeStatus,
    pub closed_at: Option<DateTime<Utc>>,
    pub pnl: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceSummary {
    /// Percent of closed trades with positive PnL. 100 when nothing closed yet.
    pub win_rate: f64,
    /// Sum of PnL over trades closed on the given day.
    pub daily_pnl: f64,
    pub open_trades: usize,
    pub closed_trades: usize,
}

#[derive(Debug, Default)]
pub struct TradeLog {
    records: Vec<TradeRecord>,
}

impl TradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_open(&mut self, record: TradeRecord) {
        self.records.push(record);
    }

    /// Marks a trade closed with its final PnL. Unknown tags are ignored.
    /// Returns the closed record, if any.
    pub fn record_close(
        &mut self,
        client_tag: &str,
        pnl: f64,
        now: DateTime<Utc>,
    ) -> Option<TradeRecord> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.client_tag == client_tag && r.status == TradeStatus::Open)?;
        record.status = TradeStatus::Closed;
        record.closed_at = Some(now);
        record.pnl = pnl;
        Some(record.clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn performance(&self, today: DateTime<Utc>) -> PerformanceSummary {
        let closed: Vec<&TradeRecord> = self
            .records
            .iter()
            .filter(|r| r.status == TradeStatus::Closed)
            .collect();

        let win_rate = if closed.is_empty() {
            // No track record yet is not a health problem
            100.0
        } else {
            let wins = closed.iter().filter(|r| r.pnl > 0.0).count();
            wins as f64 / closed.len() as f64 * 100.0
        };

        let day = today.date_naive();
        let daily_pnl = closed
            .iter()
            .filter(|r| r.closed_at.is_some_and(|t| t.date_naive() == day))
            .map(|r| r.pnl)
            .sum();

        PerformanceSummary {
            win_rate,
            daily_pnl,
            open_trades: self.records.len() - closed.len(),
            closed_trades: closed.len(),
        }
    }
}
