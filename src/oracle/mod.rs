// The external signal source and the validation boundary around it
mod rules;
mod validate;

pub use rules::RuleOracle;
pub use validate::{derive_risk_reward, validate_raw};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::analysis::MarketSnapshot;
use crate::config::{Confidence, RiskReward};
use crate::domain::SignalAction;

/// A fully validated trade recommendation. Raw oracle payloads never travel
/// past [`validate_raw`]; this type is the only thing the engine consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub action: SignalAction,
    pub confidence: Confidence,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_reward: RiskReward,
    pub reasons: Vec<String>,
}

impl Signal {
    /// The safe default used when the oracle fails or returns garbage:
    /// HOLD with zero confidence, which no execution path can act on.
    pub fn hold(reason: &str) -> Self {
        Self {
            action: SignalAction::Hold,
            confidence: Confidence::new(0.0),
            entry_price: 0.0,
            stop_loss: 0.0,
            take_profit: 0.0,
            risk_reward: RiskReward::new(1.0),
            reasons: vec![reason.to_string()],
        }
    }
}

/// Whatever produces trade recommendations: a model endpoint, an LLM call,
/// or a stub. The engine only sees the raw JSON it returns.
#[async_trait]
pub trait SignalOracle: Send + Sync {
    async fn recommend(&self, snapshot: &MarketSnapshot) -> Result<serde_json::Value>;
}
