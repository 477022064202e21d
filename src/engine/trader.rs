//! The evaluation scheduler: drives the fixed-interval loop, fans evaluation
//! out across symbols, and funnels every order through one serialization lock.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{debug, error, info, warn};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::analysis::SnapshotBuilder;
use crate::config::Settings;
use crate::config::constants::PAUSED_POLL_INTERVAL;
use crate::config::{Confidence, Pips};
use crate::data::{
    BrokerGateway, Exposure, MarketDataSource, OpenPosition, OrderReceipt, OrderRequest,
};
use crate::domain::OrderSide;
use crate::engine::failsafe::{check_system_health, margin_level_ok};
use crate::engine::gate;
use crate::engine::retry::{RetryingMarketData, with_default_retry};
use crate::engine::risk::{RiskMode, RiskState};
use crate::engine::sizing::size_position;
use crate::engine::trade_log::{PerformanceSummary, TradeLog, TradeRecord, TradeStatus};
use crate::notify::{Notifier, TradeEvent, send_event};
use crate::oracle::{Signal, SignalOracle, validate_raw};

/// What happened to one symbol within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolOutcome {
    /// Not evaluated: sentinel snapshot, or a stop arrived first.
    Skipped,
    /// Evaluated but nothing to do (HOLD, gate rejection, dry run).
    NoTrade,
    Executed,
    ExecutionFailed,
}

/// Per-cycle tally, mostly for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub evaluated: usize,
    pub executed: usize,
    pub failed: usize,
}

pub struct Trader {
    settings: Settings,
    oracle: Arc<dyn SignalOracle>,
    broker: Arc<dyn BrokerGateway>,
    notifier: Arc<dyn Notifier>,
    snapshots: SnapshotBuilder,

    risk: Mutex<RiskState>,
    trade_log: Mutex<TradeLog>,
    last_analysis: Mutex<HashMap<String, DateTime<Utc>>>,

    /// THE execution lock. Gate → size → submit → bookkeeping runs under it,
    /// so exposure checks and daily counters can never race between symbols.
    execution: Mutex<()>,

    dry_run: bool,
}

impl Trader {
    pub fn new(
        settings: Settings,
        market: Arc<dyn MarketDataSource>,
        oracle: Arc<dyn SignalOracle>,
        broker: Arc<dyn BrokerGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let snapshots = SnapshotBuilder::new(
            Arc::new(RetryingMarketData::new(market)),
            settings.timeframes.clone(),
        );
        let risk = RiskState::new(
            Utc::now(),
            settings.max_consecutive_losses,
            settings.cooldown_period,
        );
        Self {
            settings,
            oracle,
            broker,
            notifier,
            snapshots,
            risk: Mutex::new(risk),
            trade_log: Mutex::new(TradeLog::new()),
            last_analysis: Mutex::new(HashMap::new()),
            execution: Mutex::new(()),
            dry_run: false,
        }
    }

    /// Evaluate everything but never submit orders.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn mode(&self) -> RiskMode {
        self.risk.lock().await.mode()
    }

    pub async fn performance(&self) -> PerformanceSummary {
        self.trade_log.lock().await.performance(Utc::now())
    }

    pub async fn start(&self) {
        self.risk.lock().await.start(Utc::now());
        send_event(&*self.notifier, TradeEvent::EngineStarted).await;
    }

    pub async fn pause(&self) {
        self.risk.lock().await.pause();
    }

    pub async fn stop(&self) {
        self.risk.lock().await.stop();
        send_event(&*self.notifier, TradeEvent::EngineStopped { emergency: false }).await;
    }

    /// Stop immediately and, when configured, flatten all open positions.
    pub async fn emergency_stop(&self) {
        error!("EMERGENCY STOP INITIATED");
        self.risk.lock().await.stop();

        if self.settings.close_positions_on_stop {
            match with_default_retry("close_all_positions", || self.broker.close_all_positions())
                .await
            {
                Ok(closed) => info!("Closed {} positions", closed.len()),
                Err(e) => error!("Failed to flatten positions: {e:#}"),
            }
        }

        send_event(&*self.notifier, TradeEvent::EngineStopped { emergency: true }).await;
    }

    /// Main loop: starts the machine and cycles until an operator stop.
    pub async fn run(&self) -> Result<()> {
        self.start().await;
        info!(
            "Trading loop started: {} symbols, scan interval {:?}",
            self.settings.symbols.len(),
            self.settings.scan_interval
        );

        loop {
            match self.mode().await {
                RiskMode::Stopped => break,
                RiskMode::Paused => {
                    tokio::time::sleep(PAUSED_POLL_INTERVAL.min(self.settings.scan_interval)).await;
                }
                RiskMode::Running => {
                    let report = self.run_cycle().await;
                    debug!(
                        "Cycle done: {} evaluated, {} executed, {} failed",
                        report.evaluated, report.executed, report.failed
                    );
                    tokio::time::sleep(self.settings.scan_interval).await;
                }
            }
        }

        info!("Trading loop ended");
        Ok(())
    }

    /// One full evaluation pass over all configured symbols.
    pub async fn run_cycle(&self) -> CycleReport {
        let now = Utc::now();
        self.risk.lock().await.check_daily_reset(now);

        // Account refresh, once per cycle
        let account = match with_default_retry("get_account", || self.broker.get_account()).await {
            Ok(account) => account,
            Err(e) => {
                // Account unreachable after retries: pause pending recovery
                error!("Account unreachable, pausing trading: {e:#}");
                self.risk.lock().await.pause();
                send_event(
                    &*self.notifier,
                    TradeEvent::HealthAlert {
                        critical: false,
                        reasons: vec![format!("account unreachable: {e:#}")],
                    },
                )
                .await;
                return CycleReport::default();
            }
        };

        if account.balance <= 0.0 || account.equity <= 0.0 {
            warn!("Insufficient balance/equity, pausing trading");
            self.risk.lock().await.pause();
            send_event(
                &*self.notifier,
                TradeEvent::HealthAlert {
                    critical: false,
                    reasons: vec!["balance or equity depleted".to_string()],
                },
            )
            .await;
            return CycleReport::default();
        }

        // Failsafe diagnostics over account + track record
        let perf = self.trade_log.lock().await.performance(now);
        let health = check_system_health(&account, &perf, now);
        if health.critical {
            error!("Critical health: {}", health.reasons.join("; "));
            send_event(
                &*self.notifier,
                TradeEvent::HealthAlert {
                    critical: true,
                    reasons: health.reasons.clone(),
                },
            )
            .await;
            self.emergency_stop().await;
            return CycleReport::default();
        }
        if !health.reasons.is_empty() {
            send_event(
                &*self.notifier,
                TradeEvent::HealthAlert {
                    critical: false,
                    reasons: health.reasons.clone(),
                },
            )
            .await;
        }

        if !margin_level_ok(&account) {
            warn!("Low margin level ({:.0}%), skipping cycle", account.margin_level);
            return CycleReport::default();
        }

        {
            let risk = self.risk.lock().await;
            if !risk.is_running() {
                return CycleReport::default();
            }
            if risk.daily_trade_count >= self.settings.max_daily_trades {
                info!("Daily trade limit reached ({})", risk.daily_trade_count);
                return CycleReport::default();
            }
        }

        // Exposure refresh, once per cycle; updated in place as orders fill
        let exposure =
            match with_default_retry("get_open_positions", || self.broker.get_open_positions())
                .await
            {
                Ok(positions) => Arc::new(Mutex::new(Exposure::new(positions))),
                Err(e) => {
                    warn!("Could not read open positions, skipping cycle: {e:#}");
                    return CycleReport::default();
                }
            };

        // Eligibility: not cooled down, not analyzed within the scan interval
        let mut eligible = Vec::new();
        {
            let risk = self.risk.lock().await;
            let last = self.last_analysis.lock().await;
            for symbol in &self.settings.symbols {
                if risk.is_cooled_down(symbol, now) {
                    debug!("{symbol} is cooling down, skipped");
                    continue;
                }
                if let Some(at) = last.get(symbol) {
                    let elapsed = (now - *at).to_std().unwrap_or_default();
                    if elapsed < self.settings.scan_interval {
                        continue;
                    }
                }
                eligible.push(symbol.clone());
            }
        }

        let evaluations = eligible
            .iter()
            .map(|symbol| self.evaluate_symbol(symbol, account.balance, Arc::clone(&exposure)));
        let outcomes = join_all(evaluations).await;

        let mut report = CycleReport::default();
        for outcome in outcomes {
            match outcome {
                SymbolOutcome::Skipped => {}
                SymbolOutcome::NoTrade => report.evaluated += 1,
                SymbolOutcome::Executed => {
                    report.evaluated += 1;
                    report.executed += 1;
                }
                SymbolOutcome::ExecutionFailed => {
                    report.evaluated += 1;
                    report.failed += 1;
                }
            }
        }
        report
    }

    async fn evaluate_symbol(
        &self,
        symbol: &str,
        balance: f64,
        exposure: Arc<Mutex<Exposure>>,
    ) -> SymbolOutcome {
        // Cooperative stop checkpoint: observed before evaluation begins
        if !self.risk.lock().await.is_running() {
            return SymbolOutcome::Skipped;
        }

        let snapshot = self.snapshots.build(symbol).await;
        if !snapshot.is_evaluable() {
            self.mark_analyzed(symbol).await;
            return SymbolOutcome::Skipped;
        }

        let signal = match with_default_retry("oracle.recommend", || {
            self.oracle.recommend(&snapshot)
        })
        .await
        {
            Ok(raw) => validate_raw(&raw, &snapshot),
            Err(e) => {
                warn!("Oracle unavailable for {symbol}, holding: {e:#}");
                Signal::hold("oracle unavailable")
            }
        };
        self.mark_analyzed(symbol).await;

        // Serialize everything from gate to bookkeeping
        let _permit = self.execution.lock().await;

        // A stop may have landed while we awaited data or the oracle
        if !self.risk.lock().await.is_running() {
            return SymbolOutcome::Skipped;
        }

        let verdict = {
            let exposure = exposure.lock().await;
            gate::evaluate(&signal, &snapshot, &self.settings, &exposure)
        };
        if !verdict.is_accepted() {
            return SymbolOutcome::NoTrade;
        }

        match self.execute(symbol, &signal, balance).await {
            Ok(Some(receipt)) => {
                exposure.lock().await.push(OpenPosition {
                    symbol: receipt.symbol.clone(),
                    side: receipt.side,
                    volume: receipt.volume,
                    entry_price: signal.entry_price,
                });
                self.risk.lock().await.record_execution();
                SymbolOutcome::Executed
            }
            Ok(None) => SymbolOutcome::NoTrade, // dry run
            Err(e) => {
                error!("Trade execution failed for {symbol}: {e:#}");
                self.risk.lock().await.record_loss(symbol, Utc::now());
                SymbolOutcome::ExecutionFailed
            }
        }
    }

    /// Sizes and submits the order. Returns None in dry-run mode.
    async fn execute(
        &self,
        symbol: &str,
        signal: &Signal,
        balance: f64,
    ) -> Result<Option<OrderReceipt>> {
        let side = OrderSide::try_from(signal.action)?;

        let info = with_default_retry("get_symbol_info", || self.broker.get_symbol_info(symbol))
            .await?;
        let stop_distance =
            Pips::from_price_distance(signal.entry_price - signal.stop_loss, info.pip_size);
        let volume =
            size_position(balance, self.settings.max_risk_percent, stop_distance, &info);

        let client_tag = client_tag(signal.confidence);
        let order = OrderRequest {
            symbol: symbol.to_string(),
            side,
            volume,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
            client_tag: client_tag.clone(),
        };

        if self.dry_run {
            info!("[dry-run] would place {symbol} {side} {volume} (tag {client_tag})");
            return Ok(None);
        }

        let receipt =
            with_default_retry("place_order", || self.broker.place_order(order.clone())).await?;

        self.trade_log.lock().await.record_open(TradeRecord {
            client_tag: client_tag.clone(),
            symbol: symbol.to_string(),
            side,
            volume,
            entry_price: signal.entry_price,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
            confidence: signal.confidence,
            reasons: signal.reasons.clone(),
            opened_at: receipt.executed_at,
            status: TradeStatus::Open,
            closed_at: None,
            pnl: 0.0,
        });

        info!("Trade executed: {symbol} {side} {volume}");
        send_event(
            &*self.notifier,
            TradeEvent::TradeOpened {
                symbol: symbol.to_string(),
                side,
                volume,
                entry_price: signal.entry_price,
                stop_loss: signal.stop_loss,
                take_profit: signal.take_profit,
                client_tag,
            },
        )
        .await;

        Ok(Some(receipt))
    }

    /// Trade-result feedback from the outside world (broker close, monitor).
    /// Wins and losses feed the streak machinery and the trade log.
    pub async fn on_trade_result(&self, client_tag: &str, pnl: f64) {
        let now = Utc::now();
        let closed = self.trade_log.lock().await.record_close(client_tag, pnl, now);

        let Some(record) = closed else {
            debug!("Trade result for unknown tag {client_tag} ignored");
            return;
        };

        {
            let mut risk = self.risk.lock().await;
            if pnl > 0.0 {
                risk.record_win();
            } else {
                risk.record_loss(&record.symbol, now);
            }
        }

        send_event(
            &*self.notifier,
            TradeEvent::TradeClosed {
                symbol: record.symbol,
                client_tag: client_tag.to_string(),
                pnl,
            },
        )
        .await;
    }

    async fn mark_analyzed(&self, symbol: &str) {
        self.last_analysis
            .lock()
            .await
            .insert(symbol.to_string(), Utc::now());
    }
}

fn client_tag(confidence: Confidence) -> String {
    format!(
        "ai_{:.2}_{}",
        confidence.value(),
        Uuid::new_v4().simple()
    )
}
