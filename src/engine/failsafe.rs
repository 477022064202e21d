//! Account/performance health diagnostics. A critical report forces the
//! engine to stop; warnings only surface through the notifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::constants::failsafe;
use crate::data::AccountInfo;
use crate::engine::trade_log::PerformanceSummary;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    pub healthy: bool,
    pub critical: bool,
    pub reasons: Vec<String>,
    pub equity: f64,
    pub used_margin: f64,
    pub win_rate: f64,
    pub daily_pnl: f64,
}

/// Pure diagnostics over the account and trade-log summary.
pub fn check_system_health(
    account: &AccountInfo,
    perf: &PerformanceSummary,
    now: DateTime<Utc>,
) -> HealthReport {
    let mut critical = false;
    let mut reasons = Vec::new();

    if account.equity < failsafe::MIN_EQUITY {
        critical = true;
        reasons.push("Account equity critically low".to_string());
    }

    if perf.win_rate < failsafe::LOW_WIN_RATE {
        reasons.push(format!("Low win rate: {:.0}%", perf.win_rate));
    }

    if perf.daily_pnl < failsafe::DAILY_PNL_FLOOR {
        reasons.push(format!("Daily PnL in dangerous territory: {:.2}", perf.daily_pnl));
    }

    HealthReport {
        timestamp: now,
        healthy: !critical,
        critical,
        reasons,
        equity: account.equity,
        used_margin: account.used_margin,
        win_rate: perf.win_rate,
        daily_pnl: perf.daily_pnl,
    }
}

/// Margin guard from the per-cycle tradeability check: a reported margin
/// level under the floor means "skip this cycle". Zero = not reported = fine.
pub fn margin_level_ok(account: &AccountInfo) -> bool {
    account.margin_level <= 0.0 || account.margin_level >= failsafe::MIN_MARGIN_LEVEL
}
