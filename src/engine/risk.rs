//! The stateful risk machinery: run mode, streak counters, per-symbol
//! cooldowns and daily counters. One instance lives for the process lifetime,
//! owned by the trader and passed into each cycle, no hidden globals.

use std::collections::HashMap;

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
pub enum RiskMode {
    Running,
    Paused,
    #[default]
    Stopped,
}

#[derive(Debug, Clone)]
pub struct RiskState {
    mode: RiskMode,
    pub consecutive_losses: u32,
    pub consecutive_wins: u32,
    pub daily_trade_count: u32,
    day_anchor: NaiveDate,
    cooldowns: HashMap<String, DateTime<Utc>>,

    max_consecutive_losses: u32,
    cooldown_period: ChronoDuration,
}

impl RiskState {
    pub fn new(
        now: DateTime<Utc>,
        max_consecutive_losses: u32,
        cooldown_period: ChronoDuration,
    ) -> Self {
        Self {
            mode: RiskMode::Stopped,
            consecutive_losses: 0,
            consecutive_wins: 0,
            daily_trade_count: 0,
            day_anchor: now.date_naive(),
            cooldowns: HashMap::new(),
            max_consecutive_losses,
            cooldown_period,
        }
    }

    pub fn mode(&self) -> RiskMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.mode == RiskMode::Running
    }

    /// `* → Running`. Doubles as resume from Paused.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.mode = RiskMode::Running;
        self.day_anchor = now.date_naive();
        info!("Trading started");
    }

    /// `Running → Paused`. No effect from other modes.
    pub fn pause(&mut self) {
        if self.mode == RiskMode::Running {
            self.mode = RiskMode::Paused;
            info!("Trading paused");
        }
    }

    /// `* → Stopped`. Terminal until an explicit start().
    pub fn stop(&mut self) {
        self.mode = RiskMode::Stopped;
        info!("Trading stopped");
    }

    /// Bookkeeping for a successfully executed trade.
    pub fn record_execution(&mut self) {
        self.daily_trade_count += 1;
        self.consecutive_losses = 0;
    }

    /// Win feedback: resets the loss streak.
    pub fn record_win(&mut self) {
        self.consecutive_wins += 1;
        self.consecutive_losses = 0;
    }

    /// Loss feedback. When the streak reaches the configured maximum while
    /// Running, trading pauses (once) and the symbol goes on cooldown.
    /// Returns true only on the transition itself.
    pub fn record_loss(&mut self, symbol: &str, now: DateTime<Utc>) -> bool {
        self.consecutive_losses += 1;
        self.consecutive_wins = 0;

        if self.consecutive_losses >= self.max_consecutive_losses && self.mode == RiskMode::Running
        {
            warn!(
                "{} consecutive losses, pausing trading and cooling down {symbol}",
                self.consecutive_losses
            );
            self.mode = RiskMode::Paused;
            self.set_cooldown(symbol, now);
            return true;
        }
        false
    }

    pub fn set_cooldown(&mut self, symbol: &str, now: DateTime<Utc>) {
        self.cooldowns
            .insert(symbol.to_string(), now + self.cooldown_period);
    }

    /// Read-only: a cooled-down symbol is skipped with no side effects.
    pub fn is_cooled_down(&self, symbol: &str, now: DateTime<Utc>) -> bool {
        self.cooldowns
            .get(symbol)
            .is_some_and(|until| *until > now)
    }

    /// Resets daily counters when the UTC date advances past the anchor.
    /// Idempotent within a day: repeated checks do nothing. Returns whether
    /// a reset happened.
    pub fn check_daily_reset(&mut self, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        if today > self.day_anchor {
            self.daily_trade_count = 0;
            self.consecutive_losses = 0;
            self.day_anchor = today;
            info!("Daily counters reset");
            return true;
        }
        false
    }
}
