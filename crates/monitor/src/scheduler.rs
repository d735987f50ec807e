//! Periodic polling over the symbol universe.

use crate::catalog::{MarketCatalog, SymbolUniverse};
use crate::funding::FundingChecker;
use crate::variation::VariationChecker;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Runs the variation and funding checks over every symbol on a fixed
/// interval.
///
/// The scheduler owns the cached universe and repopulates it only when
/// empty, so a failed discovery is retried on the next cycle. Symbols are
/// checked strictly sequentially: at most one in-flight REST request from
/// this component at a time, as a rate-limiting discipline on top of the
/// clients' own limiters.
pub struct PollingScheduler {
    catalog: MarketCatalog,
    variation: VariationChecker,
    funding: FundingChecker,
    universe: SymbolUniverse,
    interval: Duration,
    should_stop: Arc<AtomicBool>,
}

impl PollingScheduler {
    pub fn new(
        catalog: MarketCatalog,
        variation: VariationChecker,
        funding: FundingChecker,
        interval: Duration,
    ) -> Self {
        Self {
            catalog,
            variation,
            funding,
            universe: SymbolUniverse::default(),
            interval,
            should_stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a handle to signal the scheduler to stop.
    #[must_use]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.should_stop)
    }

    pub fn universe(&self) -> &SymbolUniverse {
        &self.universe
    }

    fn stopped(&self) -> bool {
        self.should_stop.load(Ordering::SeqCst)
    }

    /// Runs a cycle now, then one every interval, until stopped.
    pub async fn run(&mut self) {
        loop {
            self.run_cycle().await;
            if self.stopped() {
                tracing::info!("polling scheduler stopping on request");
                return;
            }
            tokio::time::sleep(self.interval).await;
            if self.stopped() {
                tracing::info!("polling scheduler stopping on request");
                return;
            }
        }
    }

    /// Runs one full cycle: discovery if needed, then both checks per symbol.
    pub async fn run_cycle(&mut self) {
        if self.universe.is_empty() {
            match self.catalog.discover().await {
                Ok(universe) => self.universe = universe,
                Err(e) => {
                    tracing::warn!(error = %e, "symbol discovery failed, retrying next cycle");
                }
            }
        }

        for symbol in self.universe.iter() {
            if self.should_stop.load(Ordering::SeqCst) {
                return;
            }
            self.variation.check(symbol).await;
            self.funding.check(symbol).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use vigil_bybit::BybitClient;
    use vigil_coingecko::CoinGeckoClient;
    use vigil_core::{Alert, AlertDispatcher, AlertSink};

    struct RecordingSink {
        alerts: Mutex<Vec<Alert>>,
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        async fn deliver(&self, alert: &Alert) -> Result<()> {
            self.alerts.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }

    // Nothing listens on this port, so every request fails fast.
    fn unreachable_scheduler() -> (PollingScheduler, Arc<RecordingSink>) {
        let bybit = Arc::new(BybitClient::new("http://127.0.0.1:9".to_string()));
        let gecko = Arc::new(CoinGeckoClient::new("http://127.0.0.1:9".to_string()));
        let sink = Arc::new(RecordingSink {
            alerts: Mutex::new(Vec::new()),
        });
        let dispatcher = AlertDispatcher::new(sink.clone());

        let scheduler = PollingScheduler::new(
            MarketCatalog::new(Arc::clone(&bybit)),
            VariationChecker::new(gecko, dispatcher.clone(), 7.0),
            FundingChecker::new(bybit, dispatcher, -0.0005),
            Duration::from_secs(300),
        );
        (scheduler, sink)
    }

    #[tokio::test]
    async fn test_cycle_survives_failures_for_every_symbol() {
        let (mut scheduler, sink) = unreachable_scheduler();
        scheduler.universe = ["btc", "eth", "sol"]
            .into_iter()
            .map(String::from)
            .collect();

        // Every REST call fails; the cycle must still visit all symbols
        // and return without propagating anything.
        scheduler.run_cycle().await;

        assert_eq!(scheduler.universe().len(), 3);
        assert!(sink.alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_discovery_leaves_universe_empty_for_retry() {
        let (mut scheduler, _sink) = unreachable_scheduler();

        scheduler.run_cycle().await;

        assert!(scheduler.universe().is_empty());
    }

    #[tokio::test]
    async fn test_stop_handle_short_circuits_cycle() {
        let (mut scheduler, _sink) = unreachable_scheduler();
        scheduler.universe = ["btc"].into_iter().map(String::from).collect();
        scheduler.stop_handle().store(true, Ordering::SeqCst);

        scheduler.run_cycle().await;
        scheduler.run().await;
    }
}
