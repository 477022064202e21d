//! Position sizing: risk budget → order volume in lots.

use crate::config::constants::STANDARD_LOT_SIZE;
use crate::config::{Lots, Pips, RiskPct};
use crate::data::SymbolInfo;

/// Sizes an order so that hitting the stop loses roughly the risk budget.
///
/// risk_amount = balance × risk%; pip_value = pip_size × standard lot.
/// The raw size is floored to the broker's lot step and clamped up to the
/// minimum lot, so the result is always tradeable. A zero stop distance falls
/// back to using the risk amount directly as the per-pip risk instead of
/// dividing by zero.
pub fn size_position(
    balance: f64,
    risk: RiskPct,
    stop_distance: Pips,
    info: &SymbolInfo,
) -> Lots {
    let risk_amount = risk.amount_of(balance.max(0.0));

    let pip_value = info.pip_size * STANDARD_LOT_SIZE;
    if pip_value <= f64::EPSILON {
        return info.min_lot;
    }

    let stop_pips = stop_distance.value();
    let risk_per_pip = if stop_pips > 0.0 {
        risk_amount / stop_pips
    } else {
        risk_amount
    };

    let raw_lots = risk_per_pip / pip_value;

    let step = info.lot_step.value();
    let stepped = if step > f64::EPSILON {
        (raw_lots / step).floor() * step
    } else {
        raw_lots
    };

    let clamped = stepped.max(info.min_lot.value());
    // Broker APIs reject sub-pip-of-a-lot noise; 4 decimals is plenty
    Lots::new((clamped * 10_000.0).round() / 10_000.0)
}
