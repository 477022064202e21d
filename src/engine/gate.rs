//! The signal-acceptance gate: every oracle recommendation passes through
//! here before any sizing or submission happens.

use log::debug;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::analysis::MarketSnapshot;
use crate::config::Settings;
use crate::data::Exposure;
use crate::domain::SignalAction;
use crate::oracle::Signal;

/// Why a signal was turned away. Ordering of the checks is part of the
/// contract: the first failing rule wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum RejectReason {
    Hold,
    LowConfidence,
    SpreadTooWide,
    PoorRiskReward,
    MaxPositionsReached,
    SymbolAlreadyOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    Accepted,
    Rejected(RejectReason),
}

impl GateVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateVerdict::Accepted)
    }
}

/// Applies the acceptance rules in order, short-circuiting on the first
/// failure. Rejection is normal control flow, logged at debug level only.
pub fn evaluate(
    signal: &Signal,
    snapshot: &MarketSnapshot,
    settings: &Settings,
    exposure: &Exposure,
) -> GateVerdict {
    let verdict = check(signal, snapshot, settings, exposure);
    if let GateVerdict::Rejected(reason) = verdict {
        debug!(
            "Gate rejected {} {}: {reason} (confidence {}, rr {})",
            snapshot.symbol, signal.action, signal.confidence, signal.risk_reward
        );
    }
    verdict
}

fn check(
    signal: &Signal,
    snapshot: &MarketSnapshot,
    settings: &Settings,
    exposure: &Exposure,
) -> GateVerdict {
    use GateVerdict::Rejected;

    if signal.action == SignalAction::Hold {
        return Rejected(RejectReason::Hold);
    }
    if signal.confidence < settings.min_confidence {
        return Rejected(RejectReason::LowConfidence);
    }
    if snapshot.spread_pips > settings.max_spread_pips {
        return Rejected(RejectReason::SpreadTooWide);
    }
    if signal.risk_reward < settings.min_risk_reward {
        return Rejected(RejectReason::PoorRiskReward);
    }
    if exposure.total() >= settings.max_open_positions {
        return Rejected(RejectReason::MaxPositionsReached);
    }
    if exposure.has_symbol(&snapshot.symbol) {
        return Rejected(RejectReason::SymbolAlreadyOpen);
    }

    GateVerdict::Accepted
}
