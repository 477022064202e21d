use std::panic;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use fx_sentinel::data::{PaperBroker, SimMarket};
use fx_sentinel::notify::LogNotifier;
use fx_sentinel::oracle::RuleOracle;
use fx_sentinel::{Cli, Settings, Trader};

const PAPER_BALANCE: f64 = 10_000.0;

fn main() -> Result<()> {
    panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("CRITICAL PANIC:\n{}\nStack Trace:\n{}", info, backtrace);
    }));

    let (global_level, my_code_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Debug)
    } else {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    };

    let mut builder = env_logger::Builder::new();

    builder
        .filter(None, global_level)
        .filter(Some("fx_sentinel"), my_code_level)
        .parse_default_env()
        .init();

    let args = Cli::parse();

    let mut settings = Settings::from_env()?;
    if let Some(secs) = args.scan_interval {
        settings.scan_interval = Duration::from_secs(secs);
    }
    settings.validate()?;

    run(settings, args.dry_run)
}

#[tokio::main]
async fn run(settings: Settings, dry_run: bool) -> Result<()> {
    // Built-in paper collaborators: swap these for real transports when
    // wiring a live deployment.
    let trader = Arc::new(
        Trader::new(
            settings,
            Arc::new(SimMarket::new()),
            Arc::new(RuleOracle::new()),
            Arc::new(PaperBroker::new(PAPER_BALANCE)),
            Arc::new(LogNotifier),
        )
        .with_dry_run(dry_run),
    );

    let loop_handle = {
        let trader = Arc::clone(&trader);
        tokio::spawn(async move { trader.run().await })
    };

    tokio::signal::ctrl_c().await?;
    log::info!("Shutdown signal received");
    trader.stop().await;

    loop_handle.await??;
    Ok(())
}
