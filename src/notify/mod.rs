//! Outbound notifications. The engine emits events; it never owns or
//! constructs a concrete transport (chat bot, webhook, ...).

use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::Lots;
use crate::domain::OrderSide;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TradeEvent {
    EngineStarted,
    EngineStopped {
        emergency: bool,
    },
    TradeOpened {
        symbol: String,
        side: OrderSide,
        volume: Lots,
        entry_price: f64,
        stop_loss: f64,
        take_profit: f64,
        client_tag: String,
    },
    TradeClosed {
        symbol: String,
        client_tag: String,
        pnl: f64,
    },
    HealthAlert {
        critical: bool,
        reasons: Vec<String>,
    },
}

/// Fire-and-forget event sink. Failures must never abort a trading cycle;
/// callers go through [`send_event`] which downgrades errors to a log line.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: TradeEvent) -> Result<()>;
}

/// Delivers an event, swallowing (but logging) delivery failures.
pub async fn send_event(notifier: &dyn Notifier, event: TradeEvent) {
    if let Err(e) = notifier.notify(event).await {
        warn!("Notification delivery failed: {e:#}");
    }
}

/// Fallback notifier that just writes to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: TradeEvent) -> Result<()> {
        match &event {
            TradeEvent::TradeOpened {
                symbol,
                side,
                volume,
                ..
            } => info!("📈 Trade opened: {symbol} {side} {volume}"),
            TradeEvent::HealthAlert { critical, reasons } if *critical => {
                warn!("🛑 Critical health alert: {}", reasons.join("; "))
            }
            other => info!("Event: {other:?}"),
        }
        Ok(())
    }
}
