//! CoinGecko market data client.
//!
//! One endpoint is needed: `/api/v3/coins/{id}` with market data enabled,
//! from which the optional 1-hour USD percentage change is read. Illiquid
//! assets simply omit the field; that is not an error.

use governor::{clock::DefaultClock, state::InMemoryState, Quota, RateLimiter};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors from the CoinGecko client.
#[derive(Error, Debug)]
pub enum CoinGeckoError {
    /// Transport or decode failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status (e.g. 404 for an unknown coin id, 429 when throttled).
    #[error("CoinGecko returned status {0}")]
    Status(u16),
}

#[derive(Debug, Deserialize)]
struct CoinResponse {
    market_data: Option<MarketData>,
}

#[derive(Debug, Deserialize)]
struct MarketData {
    price_change_percentage_1h_in_currency: Option<CurrencyChange>,
}

#[derive(Debug, Deserialize)]
struct CurrencyChange {
    usd: Option<f64>,
}

impl CoinResponse {
    fn change_1h_usd(&self) -> Option<f64> {
        self.market_data
            .as_ref()?
            .price_change_percentage_1h_in_currency
            .as_ref()?
            .usd
    }
}

pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter<governor::state::direct::NotKeyed, InMemoryState, DefaultClock>>,
}

impl CoinGeckoClient {
    pub fn new(base_url: String) -> Self {
        // Public (keyless) tier allows roughly 30 calls per minute.
        let quota = Quota::per_minute(NonZeroU32::new(30).unwrap());
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            base_url,
            rate_limiter,
        }
    }

    /// Returns the coin's 1-hour USD percentage change, or `None` when the
    /// provider does not report one for this asset.
    ///
    /// # Errors
    /// Returns an error if the request fails or the provider answers with a
    /// non-success status.
    pub async fn price_change_1h(&self, coin_id: &str) -> Result<Option<f64>, CoinGeckoError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/api/v3/coins/{}", self.base_url, coin_id);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("localization", "false"),
                ("tickers", "false"),
                ("market_data", "true"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoinGeckoError::Status(status.as_u16()));
        }

        let coin: CoinResponse = response.json().await?;
        Ok(coin.change_1h_usd())
    }
}
