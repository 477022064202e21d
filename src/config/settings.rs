//! Runtime settings, loaded from environment variables with coded defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Duration as ChronoDuration;

use crate::config::{Confidence, Pips, RiskPct, RiskReward};
use crate::domain::Timeframe;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Seconds between evaluation cycles (also the per-symbol re-analysis floor).
    pub scan_interval: Duration,
    pub symbols: Vec<String>,
    pub timeframes: Vec<Timeframe>,

    pub max_risk_percent: RiskPct,
    pub max_open_positions: usize,
    pub max_spread_pips: Pips,
    pub min_risk_reward: RiskReward,
    pub min_confidence: Confidence,

    pub max_consecutive_losses: u32,
    pub max_daily_trades: u32,
    pub cooldown_period: ChronoDuration,

    pub close_positions_on_stop: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(60),
            symbols: vec!["EURUSD".into(), "GBPUSD".into(), "USDJPY".into()],
            timeframes: vec![Timeframe::M5, Timeframe::M15, Timeframe::H1],
            max_risk_percent: RiskPct::new(2.0),
            max_open_positions: 5,
            max_spread_pips: Pips::new(3.0),
            min_risk_reward: RiskReward::new(1.5),
            min_confidence: super::constants::gate::MIN_CONFIDENCE,
            max_consecutive_losses: 3,
            max_daily_trades: 10,
            cooldown_period: ChronoDuration::minutes(30),
            close_positions_on_stop: true,
        }
    }
}

impl Settings {
    /// Builds settings from the process environment, falling back to defaults
    /// for anything unset. Malformed values are errors, not silent fallbacks.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let scan_secs: u64 =
            parse_var("SCAN_INTERVAL", defaults.scan_interval.as_secs())?;
        let cooldown_mins: i64 = parse_var(
            "COOLDOWN_PERIOD_MINUTES",
            defaults.cooldown_period.num_minutes(),
        )?;

        let symbols = match env::var("CURRENCIES") {
            Ok(raw) => split_list(&raw),
            Err(_) => defaults.symbols,
        };

        let timeframes = match env::var("TIMEFRAMES") {
            Ok(raw) => split_list(&raw)
                .iter()
                .map(|tf| {
                    Timeframe::from_str(tf)
                        .with_context(|| format!("unknown timeframe in TIMEFRAMES: {tf}"))
                })
                .collect::<Result<Vec<_>>>()?,
            Err(_) => defaults.timeframes,
        };

        let settings = Self {
            scan_interval: Duration::from_secs(scan_secs),
            symbols,
            timeframes,
            max_risk_percent: RiskPct::new(parse_var(
                "MAX_RISK_PERCENT",
                defaults.max_risk_percent.value(),
            )?),
            max_open_positions: parse_var("MAX_OPEN_POSITIONS", defaults.max_open_positions)?,
            max_spread_pips: Pips::new(parse_var(
                "MAX_SPREAD_PIPS",
                defaults.max_spread_pips.value(),
            )?),
            min_risk_reward: RiskReward::new(parse_var(
                "MIN_RISK_REWARD",
                defaults.min_risk_reward.value(),
            )?),
            min_confidence: Confidence::new(parse_var(
                "MIN_CONFIDENCE",
                defaults.min_confidence.value(),
            )?),
            max_consecutive_losses: parse_var(
                "MAX_CONSECUTIVE_LOSSES",
                defaults.max_consecutive_losses,
            )?,
            max_daily_trades: parse_var("MAX_DAILY_TRADES", defaults.max_daily_trades)?,
            cooldown_period: ChronoDuration::minutes(cooldown_mins),
            close_positions_on_stop: parse_var(
                "CLOSE_POSITIONS_ON_STOP",
                defaults.close_positions_on_stop,
            )?,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan_interval.is_zero() {
            bail!("SCAN_INTERVAL must be positive");
        }
        if self.symbols.is_empty() {
            bail!("CURRENCIES must list at least one symbol");
        }
        if self.timeframes.is_empty() {
            bail!("TIMEFRAMES must list at least one timeframe");
        }
        if self.max_open_positions == 0 {
            bail!("MAX_OPEN_POSITIONS must be at least 1");
        }
        if self.max_consecutive_losses == 0 {
            bail!("MAX_CONSECUTIVE_LOSSES must be at least 1");
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {name}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
