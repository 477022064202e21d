//! End-to-end cycle tests over the trading engine with scripted collaborators.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};

use fx_sentinel::analysis::MarketSnapshot;
use fx_sentinel::config::{Lots, Pips, Settings};
use fx_sentinel::data::{
    AccountInfo, BrokerGateway, MarketDataSource, OpenPosition, OrderReceipt, OrderRequest, Quote,
    SymbolInfo,
};
use fx_sentinel::domain::{Candle, OrderSide, Timeframe};
use fx_sentinel::engine::{CycleReport, RiskMode, Trader};
use fx_sentinel::notify::{Notifier, TradeEvent};
use fx_sentinel::oracle::SignalOracle;

// ---- scripted collaborators ----

/// Healthy market for every symbol except those listed in `dead_quotes`.
struct ScriptedMarket {
    dead_quotes: HashSet<String>,
}

impl ScriptedMarket {
    fn healthy() -> Self {
        Self {
            dead_quotes: HashSet::new(),
        }
    }

    fn with_dead_quote(symbol: &str) -> Self {
        let mut dead_quotes = HashSet::new();
        dead_quotes.insert(symbol.to_string());
        Self { dead_quotes }
    }
}

#[async_trait]
impl MarketDataSource for ScriptedMarket {
    async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        if self.dead_quotes.contains(symbol) {
            bail!("feed down for {symbol}");
        }
        Ok(Quote {
            symbol: symbol.to_string(),
            bid: 1.09995,
            ask: 1.10005,
            spread_pips: Pips::new(1.0),
            timestamp: Utc::now(),
        })
    }

    async fn get_history(
        &self,
        _symbol: &str,
        _timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Candle>> {
        Ok((0..count)
            .map(|i| {
                let drift = i as f64 * 0.00001;
                Candle::new(
                    i as i64 * 60_000,
                    1.0990 + drift,
                    1.0995 + drift,
                    1.0985 + drift,
                    1.0992 + drift,
                    100.0,
                )
            })
            .collect())
    }
}

/// Always answers with the same raw payload.
struct FixedOracle {
    payload: Value,
}

impl FixedOracle {
    fn buy(confidence: f64) -> Self {
        Self {
            payload: json!({
                "signal": "BUY",
                "confidence": confidence,
                "entry_price": 1.1000,
                "stop_loss": 1.0980,
                "take_profit": 1.1040,
                "reasons": ["scripted"],
            }),
        }
    }

    fn hold() -> Self {
        Self {
            payload: json!({ "signal": "HOLD", "confidence": 0.9 }),
        }
    }
}

#[async_trait]
impl SignalOracle for FixedOracle {
    async fn recommend(&self, _snapshot: &MarketSnapshot) -> Result<Value> {
        Ok(self.payload.clone())
    }
}

/// In-memory broker that records every submitted order. Can be told to
/// reject all orders to drive the loss-streak machinery.
struct RecordingBroker {
    account: AccountInfo,
    positions: StdMutex<Vec<OpenPosition>>,
    orders: StdMutex<Vec<OrderRequest>>,
    reject_orders: bool,
}

impl RecordingBroker {
    fn new() -> Self {
        Self {
            account: AccountInfo {
                balance: 10_000.0,
                equity: 10_000.0,
                used_margin: 0.0,
                margin_level: 0.0,
            },
            positions: StdMutex::new(Vec::new()),
            orders: StdMutex::new(Vec::new()),
            reject_orders: false,
        }
    }

    fn rejecting() -> Self {
        Self {
            reject_orders: true,
            ..Self::new()
        }
    }

    fn with_open_position(self, symbol: &str) -> Self {
        self.positions.lock().unwrap().push(OpenPosition {
            symbol: symbol.to_string(),
            side: OrderSide::Buy,
            volume: Lots::new(0.1),
            entry_price: 1.1,
        });
        self
    }

    fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }
}

#[async_trait]
impl BrokerGateway for RecordingBroker {
    async fn get_account(&self) -> Result<AccountInfo> {
        Ok(self.account)
    }

    async fn get_open_positions(&self) -> Result<Vec<OpenPosition>> {
        Ok(self.positions.lock().unwrap().clone())
    }

    async fn get_symbol_info(&self, _symbol: &str) -> Result<SymbolInfo> {
        Ok(SymbolInfo::default())
    }

    async fn place_order(&self, order: OrderRequest) -> Result<OrderReceipt> {
        if self.reject_orders {
            bail!("order rejected");
        }
        let receipt = OrderReceipt {
            order_id: order.client_tag.clone(),
            symbol: order.symbol.clone(),
            side: order.side,
            volume: order.volume,
            executed_at: Utc::now(),
        };
        self.positions.lock().unwrap().push(OpenPosition {
            symbol: order.symbol.clone(),
            side: order.side,
            volume: order.volume,
            entry_price: 1.1,
        });
        self.orders.lock().unwrap().push(order);
        Ok(receipt)
    }

    async fn close_all_positions(&self) -> Result<Vec<OpenPosition>> {
        Ok(std::mem::take(&mut *self.positions.lock().unwrap()))
    }
}

#[derive(Default)]
struct CollectingNotifier {
    events: StdMutex<Vec<TradeEvent>>,
}

#[async_trait]
impl Notifier for CollectingNotifier {
    async fn notify(&self, event: TradeEvent) -> Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

// ---- harness ----

fn test_settings(symbols: &[&str]) -> Settings {
    Settings {
        scan_interval: Duration::from_millis(1),
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        timeframes: vec![Timeframe::M5],
        ..Settings::default()
    }
}

struct Harness {
    trader: Trader,
    broker: Arc<RecordingBroker>,
    notifier: Arc<CollectingNotifier>,
}

fn harness(
    settings: Settings,
    market: ScriptedMarket,
    oracle: FixedOracle,
    broker: RecordingBroker,
) -> Harness {
    let broker = Arc::new(broker);
    let notifier = Arc::new(CollectingNotifier::default());
    let trader = Trader::new(
        settings,
        Arc::new(market),
        Arc::new(oracle),
        Arc::clone(&broker) as Arc<dyn BrokerGateway>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    );
    Harness {
        trader,
        broker,
        notifier,
    }
}

// ---- tests ----

#[tokio::test]
async fn a_confident_signal_executes_one_trade() {
    let h = harness(
        test_settings(&["EURUSD"]),
        ScriptedMarket::healthy(),
        FixedOracle::buy(0.9),
        RecordingBroker::new(),
    );
    h.trader.start().await;

    let report = h.trader.run_cycle().await;
    assert_eq!(
        report,
        CycleReport {
            evaluated: 1,
            executed: 1,
            failed: 0
        }
    );
    assert_eq!(h.broker.order_count(), 1);

    let orders = h.broker.orders.lock().unwrap();
    assert_eq!(orders[0].symbol, "EURUSD");
    assert_eq!(orders[0].side, OrderSide::Buy);
    assert!(orders[0].client_tag.starts_with("ai_0.90_"));

    let opened = h
        .notifier
        .events
        .lock()
        .unwrap()
        .iter()
        .any(|e| matches!(e, TradeEvent::TradeOpened { symbol, .. } if symbol == "EURUSD"));
    assert!(opened);
}

#[tokio::test]
async fn low_confidence_is_evaluated_but_never_submitted() {
    let h = harness(
        test_settings(&["EURUSD"]),
        ScriptedMarket::healthy(),
        FixedOracle::buy(0.5),
        RecordingBroker::new(),
    );
    h.trader.start().await;

    let report = h.trader.run_cycle().await;
    assert_eq!(report.evaluated, 1);
    assert_eq!(report.executed, 0);
    assert_eq!(h.broker.order_count(), 0);
}

#[tokio::test]
async fn hold_signals_never_reach_the_broker() {
    let h = harness(
        test_settings(&["EURUSD", "GBPUSD"]),
        ScriptedMarket::healthy(),
        FixedOracle::hold(),
        RecordingBroker::new(),
    );
    h.trader.start().await;

    let report = h.trader.run_cycle().await;
    assert_eq!(report.evaluated, 2);
    assert_eq!(h.broker.order_count(), 0);
}

#[tokio::test]
async fn one_dead_feed_does_not_block_the_others() {
    let h = harness(
        test_settings(&["EURUSD", "GBPUSD"]),
        ScriptedMarket::with_dead_quote("GBPUSD"),
        FixedOracle::buy(0.9),
        RecordingBroker::new(),
    );
    h.trader.start().await;

    let report = h.trader.run_cycle().await;
    // GBPUSD yields a sentinel snapshot and is skipped, EURUSD still trades
    assert_eq!(report.evaluated, 1);
    assert_eq!(report.executed, 1);
    assert_eq!(h.broker.order_count(), 1);
    assert_eq!(h.broker.orders.lock().unwrap()[0].symbol, "EURUSD");
}

#[tokio::test]
async fn an_open_symbol_is_not_doubled_up() {
    let h = harness(
        test_settings(&["EURUSD"]),
        ScriptedMarket::healthy(),
        FixedOracle::buy(0.9),
        RecordingBroker::new().with_open_position("EURUSD"),
    );
    h.trader.start().await;

    let report = h.trader.run_cycle().await;
    assert_eq!(report.evaluated, 1);
    assert_eq!(report.executed, 0);
    assert_eq!(h.broker.order_count(), 0);
}

#[tokio::test]
async fn repeated_execution_failures_pause_the_engine() {
    let settings = Settings {
        max_consecutive_losses: 3,
        ..test_settings(&["EURUSD", "GBPUSD", "USDJPY"])
    };
    let h = harness(
        settings,
        ScriptedMarket::healthy(),
        FixedOracle::buy(0.9),
        RecordingBroker::rejecting(),
    );
    h.trader.start().await;

    let report = h.trader.run_cycle().await;
    assert_eq!(report.failed, 3);
    assert_eq!(h.trader.mode().await, RiskMode::Paused);

    // While paused nothing is evaluated
    tokio::time::sleep(Duration::from_millis(2)).await;
    let report = h.trader.run_cycle().await;
    assert_eq!(report, CycleReport::default());
}

#[tokio::test]
async fn the_daily_trade_cap_stops_further_cycles() {
    let settings = Settings {
        max_daily_trades: 1,
        ..test_settings(&["EURUSD"])
    };
    let h = harness(
        settings,
        ScriptedMarket::healthy(),
        FixedOracle::buy(0.9),
        RecordingBroker::new(),
    );
    h.trader.start().await;

    let first = h.trader.run_cycle().await;
    assert_eq!(first.executed, 1);

    tokio::time::sleep(Duration::from_millis(2)).await;
    let second = h.trader.run_cycle().await;
    assert_eq!(second, CycleReport::default());
    assert_eq!(h.broker.order_count(), 1);
}

#[tokio::test]
async fn dry_run_evaluates_without_submitting() {
    let h = {
        let broker = Arc::new(RecordingBroker::new());
        let notifier = Arc::new(CollectingNotifier::default());
        let trader = Trader::new(
            test_settings(&["EURUSD"]),
            Arc::new(ScriptedMarket::healthy()),
            Arc::new(FixedOracle::buy(0.9)),
            Arc::clone(&broker) as Arc<dyn BrokerGateway>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        )
        .with_dry_run(true);
        Harness {
            trader,
            broker,
            notifier,
        }
    };
    h.trader.start().await;

    let report = h.trader.run_cycle().await;
    assert_eq!(report.evaluated, 1);
    assert_eq!(report.executed, 0);
    assert_eq!(h.broker.order_count(), 0);
}

#[tokio::test]
async fn emergency_stop_flattens_and_stops() {
    let h = harness(
        test_settings(&["EURUSD"]),
        ScriptedMarket::healthy(),
        FixedOracle::buy(0.9),
        RecordingBroker::new()
            .with_open_position("EURUSD")
            .with_open_position("GBPUSD"),
    );
    h.trader.start().await;

    h.trader.emergency_stop().await;
    assert_eq!(h.trader.mode().await, RiskMode::Stopped);
    assert!(h.broker.positions.lock().unwrap().is_empty());

    let stopped = h
        .notifier
        .events
        .lock()
        .unwrap()
        .iter()
        .any(|e| matches!(e, TradeEvent::EngineStopped { emergency: true }));
    assert!(stopped);
}

#[tokio::test]
async fn losing_trade_results_feed_the_streak_and_pause() {
    let settings = Settings {
        max_consecutive_losses: 2,
        ..test_settings(&["EURUSD", "GBPUSD"])
    };
    let h = harness(
        settings,
        ScriptedMarket::healthy(),
        FixedOracle::buy(0.9),
        RecordingBroker::new(),
    );
    h.trader.start().await;

    let report = h.trader.run_cycle().await;
    assert_eq!(report.executed, 2);

    let (tag1, tag2) = {
        let orders = h.broker.orders.lock().unwrap();
        (orders[0].client_tag.clone(), orders[1].client_tag.clone())
    };
    h.trader.on_trade_result(&tag1, -25.0).await;
    assert_eq!(h.trader.mode().await, RiskMode::Running);
    h.trader.on_trade_result(&tag2, -25.0).await;
    assert_eq!(h.trader.mode().await, RiskMode::Paused);
}

#[tokio::test]
async fn a_winning_close_resets_the_streak() {
    let settings = Settings {
        max_consecutive_losses: 2,
        ..test_settings(&["EURUSD", "GBPUSD"])
    };
    let h = harness(
        settings,
        ScriptedMarket::healthy(),
        FixedOracle::buy(0.9),
        RecordingBroker::new(),
    );
    h.trader.start().await;

    let report = h.trader.run_cycle().await;
    assert_eq!(report.executed, 2);

    let (tag1, tag2) = {
        let orders = h.broker.orders.lock().unwrap();
        (orders[0].client_tag.clone(), orders[1].client_tag.clone())
    };
    h.trader.on_trade_result(&tag1, -25.0).await;
    h.trader.on_trade_result(&tag2, 60.0).await;
    assert_eq!(h.trader.mode().await, RiskMode::Running);

    let perf = h.trader.performance().await;
    assert_eq!(perf.closed_trades, 2);
    assert!((perf.win_rate - 50.0).abs() < 1e-9);
}
