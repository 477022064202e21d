//! Bounded retry for collaborator calls. Failure paths are values, never
//! control-flow surprises: after the attempt budget the last error returns.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::warn;

use crate::config::constants::retry;
use crate::data::{MarketDataSource, Quote};
use crate::domain::{Candle, Timeframe};

/// Runs `op` up to `attempts` times with a fixed `delay` between failures.
pub async fn with_retry<T, F, Fut>(
    label: &str,
    attempts: u32,
    delay: Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    let mut last_err = anyhow::anyhow!("no attempts made");

    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("{label} failed (attempt {attempt}/{attempts}): {e:#}");
                last_err = e;
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(last_err).with_context(|| format!("{label} failed after {attempts} attempts"))
}

/// Convenience wrapper using the crate-wide retry policy.
pub async fn with_default_retry<T, F, Fut>(label: &str, op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    with_retry(label, retry::MAX_ATTEMPTS, retry::DELAY, op).await
}

/// Decorates a [`MarketDataSource`] with the bounded retry policy so snapshot
/// assembly gets retries without knowing about them.
pub struct RetryingMarketData {
    inner: Arc<dyn MarketDataSource>,
}

impl RetryingMarketData {
    pub fn new(inner: Arc<dyn MarketDataSource>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl MarketDataSource for RetryingMarketData {
    async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        with_default_retry(&format!("get_quote({symbol})"), || {
            self.inner.get_quote(symbol)
        })
        .await
    }

    async fn get_history(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Candle>> {
        with_default_retry(&format!("get_history({symbol}, {timeframe})"), || {
            self.inner.get_history(symbol, timeframe, count)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry("op", 3, Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, anyhow::Error>(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry("op", 3, Duration::ZERO, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    bail!("transient");
                }
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_the_attempt_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry("doomed", 3, Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { bail!("still down") }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let msg = format!("{:#}", result.unwrap_err());
        assert!(msg.contains("after 3 attempts"), "unexpected error: {msg}");
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let _ = with_retry("op", 0, Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, anyhow::Error>(()) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
