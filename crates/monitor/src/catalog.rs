//! Symbol universe discovery.
//!
//! Merges the spot and linear-perpetual instrument lists into one
//! deduplicated set of lower-cased base symbols.

use anyhow::anyhow;
use std::collections::BTreeSet;
use std::sync::Arc;
use vigil_bybit::{BybitClient, Instrument, InstrumentCategory};

/// Quote currency whose pairs make up the universe.
pub const QUOTE_CURRENCY: &str = "USDT";

/// Deduplicated set of lower-cased base symbols.
///
/// Invariant: entries carry no quote-currency suffix and no upper-case
/// characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolUniverse {
    symbols: BTreeSet<String>,
}

impl SymbolUniverse {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    /// Adds the base coins of instruments quoted in `quote`.
    pub fn extend_from_instruments(&mut self, instruments: &[Instrument], quote: &str) {
        for instrument in instruments {
            if instrument.symbol.ends_with(quote) {
                self.symbols.insert(instrument.base_coin.to_lowercase());
            }
        }
    }
}

impl FromIterator<String> for SymbolUniverse {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            symbols: iter.into_iter().collect(),
        }
    }
}

/// Discovers the tradable universe from the exchange instrument lists.
pub struct MarketCatalog {
    client: Arc<BybitClient>,
    quote: String,
}

impl MarketCatalog {
    pub fn new(client: Arc<BybitClient>) -> Self {
        Self {
            client,
            quote: QUOTE_CURRENCY.to_string(),
        }
    }

    /// Fetches and merges the spot and linear instrument lists.
    ///
    /// A single failed category degrades to the surviving one; the call only
    /// fails when both lists are unavailable. The caller keeps an empty
    /// universe in that case and retries on its next cycle.
    ///
    /// # Errors
    /// Returns an error if neither instrument list could be fetched.
    pub async fn discover(&self) -> anyhow::Result<SymbolUniverse> {
        let categories = [InstrumentCategory::Spot, InstrumentCategory::Linear];
        let mut universe = SymbolUniverse::default();
        let mut failures = 0;
        let mut last_error = None;

        for category in categories {
            match self.client.instruments(category).await {
                Ok(instruments) => {
                    universe.extend_from_instruments(&instruments, &self.quote);
                }
                Err(e) => {
                    tracing::warn!(
                        category = category.as_str(),
                        error = %e,
                        "instrument list unavailable"
                    );
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        if failures == categories.len() {
            return Err(last_error
                .map(|e| anyhow::Error::new(e).context("all instrument sources unavailable"))
                .unwrap_or_else(|| anyhow!("all instrument sources unavailable")));
        }

        tracing::info!(symbols = universe.len(), "discovered symbol universe");
        Ok(universe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument(symbol: &str, base: &str) -> Instrument {
        Instrument {
            symbol: symbol.to_string(),
            base_coin: base.to_string(),
        }
    }

    #[test]
    fn test_universe_merges_and_deduplicates() {
        let spot = vec![instrument("BTCUSDT", "BTC"), instrument("ETHUSDT", "ETH")];
        let linear = vec![instrument("BTCUSDT", "BTC"), instrument("SOLUSDT", "SOL")];

        let mut universe = SymbolUniverse::default();
        universe.extend_from_instruments(&spot, QUOTE_CURRENCY);
        universe.extend_from_instruments(&linear, QUOTE_CURRENCY);

        assert_eq!(universe.len(), 3);
        assert!(universe.contains("btc"));
        assert!(universe.contains("eth"));
        assert!(universe.contains("sol"));
    }

    #[test]
    fn test_universe_excludes_other_quote_currencies() {
        let instruments = vec![
            instrument("BTCUSDT", "BTC"),
            instrument("BTCUSDC", "BTC"),
            instrument("ETHBTC", "ETH"),
        ];

        let mut universe = SymbolUniverse::default();
        universe.extend_from_instruments(&instruments, QUOTE_CURRENCY);

        assert_eq!(universe.len(), 1);
        assert!(universe.contains("btc"));
    }

    #[test]
    fn test_universe_lower_cases_base_coins() {
        let instruments = vec![instrument("WIFUSDT", "WIF")];

        let mut universe = SymbolUniverse::default();
        universe.extend_from_instruments(&instruments, QUOTE_CURRENCY);

        assert!(universe.contains("wif"));
        assert!(!universe.contains("WIF"));
    }

    #[test]
    fn test_universe_iteration_is_ordered() {
        let universe: SymbolUniverse = ["sol", "btc", "eth"]
            .into_iter()
            .map(String::from)
            .collect();

        let symbols: Vec<&str> = universe.iter().collect();
        assert_eq!(symbols, vec!["btc", "eth", "sol"]);
    }

    #[tokio::test]
    async fn test_discover_fails_when_both_sources_unreachable() {
        // Nothing listens on this port; both category fetches fail fast.
        let client = Arc::new(BybitClient::new("http://127.0.0.1:9".to_string()));
        let catalog = MarketCatalog::new(client);

        assert!(catalog.discover().await.is_err());
    }
}
