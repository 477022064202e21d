//! Validation boundary between the oracle's duck-typed payload and the engine.

use std::str::FromStr;

use serde_json::Value;

use crate::analysis::MarketSnapshot;
use crate::config::{Confidence, RiskReward};
use crate::domain::SignalAction;
use crate::oracle::Signal;

/// Turns a raw oracle payload into a validated [`Signal`].
///
/// Unknown or missing sides coerce to HOLD, confidence is clamped, missing
/// prices default to the snapshot's current price, and a missing or degenerate
/// risk:reward ratio is recomputed from the prices.
pub fn validate_raw(raw: &Value, snapshot: &MarketSnapshot) -> Signal {
    let action = raw
        .get("signal")
        .and_then(Value::as_str)
        .and_then(|s| SignalAction::from_str(s).ok())
        .unwrap_or(SignalAction::Hold);

    let confidence = Confidence::new(
        raw.get("confidence").and_then(Value::as_f64).unwrap_or(0.0),
    );

    let price_or_current = |key: &str| {
        raw.get(key)
            .and_then(Value::as_f64)
            .filter(|p| p.is_finite())
            .unwrap_or(snapshot.current_price)
    };
    let entry_price = price_or_current("entry_price");
    let stop_loss = price_or_current("stop_loss");
    let take_profit = price_or_current("take_profit");

    let risk_reward = match raw.get("risk_reward_ratio").and_then(Value::as_f64) {
        Some(rr) if rr.is_finite() && rr > 0.0 => RiskReward::new(rr),
        _ => derive_risk_reward(action, entry_price, stop_loss, take_profit),
    };

    let reasons = raw
        .get("reasons")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Signal {
        action,
        confidence,
        entry_price,
        stop_loss,
        take_profit,
        risk_reward,
        reasons,
    }
}

/// Recomputes risk:reward from prices. Zero risk is treated as breakeven
/// (1.0) rather than a division fault.
pub fn derive_risk_reward(
    action: SignalAction,
    entry: f64,
    stop: f64,
    target: f64,
) -> RiskReward {
    let (risk, reward) = match action {
        SignalAction::Buy => ((entry - stop).abs(), (target - entry).abs()),
        SignalAction::Sell => ((stop - entry).abs(), (entry - target).abs()),
        SignalAction::Hold => ((entry - stop).abs(), (target - entry).abs()),
    };

    if risk > f64::EPSILON {
        RiskReward::new(reward / risk)
    } else {
        RiskReward::new(1.0)
    }
}
