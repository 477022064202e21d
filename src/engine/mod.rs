// The trading decision engine
mod failsafe;
mod gate;
mod retry;
mod risk;
mod sizing;
mod trade_log;
mod trader;

pub use failsafe::{HealthReport, check_system_health, margin_level_ok};
pub use gate::{GateVerdict, RejectReason, evaluate as evaluate_gate};
pub use retry::{RetryingMarketData, with_default_retry, with_retry};
pub use risk::{RiskMode, RiskState};
pub use sizing::size_position;
pub use trade_log::{PerformanceSummary, TradeLog, TradeRecord, TradeStatus};
pub use trader::{CycleReport, SymbolOutcome, Trader};
