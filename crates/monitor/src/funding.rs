//! Funding-rate checks for linear perpetuals.

use crate::catalog::QUOTE_CURRENCY;
use std::sync::Arc;
use vigil_bybit::BybitClient;
use vigil_core::{Alert, AlertDispatcher};

/// Builds the derivative pair name for a base symbol ("btc" -> "BTCUSDT").
pub fn derivative_pair(symbol: &str) -> String {
    format!("{}{}", symbol.to_uppercase(), QUOTE_CURRENCY)
}

/// Checks a symbol's most recent funding rate against a (negative) threshold.
pub struct FundingChecker {
    bybit: Arc<BybitClient>,
    dispatcher: AlertDispatcher,
    threshold: f64,
}

impl FundingChecker {
    pub fn new(bybit: Arc<BybitClient>, dispatcher: AlertDispatcher, threshold: f64) -> Self {
        Self {
            bybit,
            dispatcher,
            threshold,
        }
    }

    /// Runs one check. Failures, missing records, and unparseable rates are
    /// swallowed so one symbol never halts the polling batch.
    pub async fn check(&self, symbol: &str) {
        let pair = derivative_pair(symbol);

        let entries = match self.bybit.funding_history(&pair, 1).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(%pair, error = %e, "funding fetch failed");
                return;
            }
        };
        // No funding history: the pair has no linear contract.
        let Some(entry) = entries.first() else {
            return;
        };

        let rate: f64 = match entry.funding_rate.parse() {
            Ok(rate) => rate,
            Err(e) => {
                tracing::debug!(%pair, raw = %entry.funding_rate, error = %e, "unparseable funding rate");
                return;
            }
        };

        tracing::debug!(%pair, rate, "funding rate");

        if let Some(alert) = evaluate(&pair, rate, self.threshold) {
            self.dispatcher.dispatch(alert);
        }
    }
}

/// Alert decision: fires iff `rate < threshold` (strict; the threshold is
/// negative, so only deeply negative funding triggers).
pub fn evaluate(pair: &str, rate: f64, threshold: f64) -> Option<Alert> {
    if rate >= threshold {
        return None;
    }

    let pct = rate * 100.0;
    Some(Alert::new(
        format!("{pair} funding alert"),
        format!("{pair} funding = {pct:.4} % (too many shorts)"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_bybit::FundingRateEntry;

    #[test]
    fn test_derivative_pair() {
        assert_eq!(derivative_pair("btc"), "BTCUSDT");
        assert_eq!(derivative_pair("wif"), "WIFUSDT");
    }

    #[test]
    fn test_threshold_is_strict() {
        // Exactly the threshold does NOT fire; just below does.
        assert!(evaluate("BTCUSDT", -0.0005, -0.0005).is_none());
        assert!(evaluate("BTCUSDT", -0.0006, -0.0005).is_some());
    }

    #[test]
    fn test_positive_and_mildly_negative_rates_are_silent() {
        assert!(evaluate("BTCUSDT", 0.0001, -0.0005).is_none());
        assert!(evaluate("BTCUSDT", -0.0001, -0.0005).is_none());
    }

    #[test]
    fn test_alert_scales_rate_to_percent() {
        let entry = FundingRateEntry {
            symbol: "BTCUSDT".to_string(),
            funding_rate: "-0.001".to_string(),
        };

        let rate: f64 = entry.funding_rate.parse().unwrap();
        let alert = evaluate(&entry.symbol, rate, -0.0005).unwrap();

        assert_eq!(alert.title, "BTCUSDT funding alert");
        assert!(alert.body.contains("-0.1000 %"));
        assert!(alert.body.contains("too many shorts"));
    }
}
