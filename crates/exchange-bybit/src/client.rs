//! Bybit V5 public REST client.
//!
//! Covers the two read-only endpoints the daemon needs: the instrument
//! catalogue per market category and the most recent funding-rate records.

use governor::{clock::DefaultClock, state::InMemoryState, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors from the Bybit REST client.
#[derive(Error, Debug)]
pub enum BybitError {
    /// Transport or decode failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Bybit returned a non-zero retCode.
    #[error("Bybit API error {code}: {message}")]
    Api { code: i64, message: String },
}

/// Market category for instrument queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentCategory {
    Spot,
    Linear,
}

impl InstrumentCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            InstrumentCategory::Spot => "spot",
            InstrumentCategory::Linear => "linear",
        }
    }
}

/// A tradable instrument as reported by `/v5/market/instruments-info`.
#[derive(Debug, Clone, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    #[serde(rename = "baseCoin")]
    pub base_coin: String,
}

/// A funding-rate record from `/v5/market/funding/history`.
#[derive(Debug, Clone, Deserialize)]
pub struct FundingRateEntry {
    pub symbol: String,
    /// Fractional rate as a decimal string, e.g. "-0.0005".
    #[serde(rename = "fundingRate")]
    pub funding_rate: String,
}

/// Standard V5 response envelope.
#[derive(Debug, Deserialize)]
struct V5Response<T> {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg")]
    ret_msg: String,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ListResult<T> {
    #[serde(default = "Vec::new")]
    list: Vec<T>,
}

impl<T> Default for ListResult<T> {
    fn default() -> Self {
        Self { list: Vec::new() }
    }
}

fn into_result<T: Default>(response: V5Response<T>) -> Result<T, BybitError> {
    if response.ret_code != 0 {
        return Err(BybitError::Api {
            code: response.ret_code,
            message: response.ret_msg,
        });
    }
    Ok(response.result.unwrap_or_default())
}

pub struct BybitClient {
    http: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter<governor::state::direct::NotKeyed, InMemoryState, DefaultClock>>,
}

impl BybitClient {
    pub fn new(base_url: String) -> Self {
        // Public endpoint budget; stays well under Bybit's per-IP limit.
        let quota = Quota::per_second(NonZeroU32::new(10).unwrap());
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

    async fn get<T>(&self, path_and_query: &str) -> Result<T, BybitError>
    where
        T: DeserializeOwned + Default,
    {
        self.rate_limiter.until_ready().await;
        let url = format!("{}{}", self.base_url, path_and_query);
        let response = self.http.get(&url).send().await?;
        let envelope: V5Response<T> = response.json().await?;
        into_result(envelope)
    }

    /// Fetches the instrument list for a market category.
    ///
    /// # Errors
    /// Returns an error if the request fails or Bybit reports a non-zero retCode.
    pub async fn instruments(
        &self,
        category: InstrumentCategory,
    ) -> Result<Vec<Instrument>, BybitError> {
        let path = format!(
            "/v5/market/instruments-info?category={}",
            category.as_str()
        );
        let result: ListResult<Instrument> = self.get(&path).await?;
        tracing::debug!(
            category = category.as_str(),
            count = result.list.len(),
            "fetched instrument list"
        );
        Ok(result.list)
    }

    /// Fetches the most recent funding-rate records for a derivative pair.
    ///
    /// # Errors
    /// Returns an error if the request fails or Bybit reports a non-zero retCode.
    pub async fn funding_history(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<Vec<FundingRateEntry>, BybitError> {
        let path = format!(
            "/v5/market/funding/history?category=linear&symbol={symbol}&limit={limit}"
        );
        let result: ListResult<FundingRateEntry> = self.get(&path).await?;
        Ok(result.list)
    }
}
