//! 1-hour price variation checks.

use std::sync::Arc;
use vigil_coingecko::CoinGeckoClient;
use vigil_core::{Alert, AlertDispatcher};

/// Checks a symbol's 1-hour price change against a percentage threshold.
pub struct VariationChecker {
    gecko: Arc<CoinGeckoClient>,
    dispatcher: AlertDispatcher,
    threshold_pct: f64,
}

impl VariationChecker {
    pub fn new(gecko: Arc<CoinGeckoClient>, dispatcher: AlertDispatcher, threshold_pct: f64) -> Self {
        Self {
            gecko,
            dispatcher,
            threshold_pct,
        }
    }

    /// Runs one check. Failures and missing data are swallowed so one
    /// symbol never halts the polling batch.
    pub async fn check(&self, symbol: &str) {
        let variation = match self.gecko.price_change_1h(symbol).await {
            Ok(Some(v)) => v,
            // Absence of a 1h change is expected for illiquid assets.
            Ok(None) => return,
            Err(e) => {
                tracing::debug!(symbol, error = %e, "variation fetch failed");
                return;
            }
        };

        tracing::debug!(symbol, variation, "1h variation");

        if let Some(alert) = evaluate(symbol, variation, self.threshold_pct) {
            self.dispatcher.dispatch(alert);
        }
    }
}

/// Alert decision: fires iff `|variation| >= threshold_pct`.
pub fn evaluate(symbol: &str, variation: f64, threshold_pct: f64) -> Option<Alert> {
    if variation.abs() < threshold_pct {
        return None;
    }

    let arrow = if variation > 0.0 { '↑' } else { '↓' };
    let upper = symbol.to_uppercase();
    Some(Alert::new(
        format!("{upper} {arrow} {variation:.2} %"),
        format!("{upper} moved {variation:.2} % over the last hour."),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_at_threshold() {
        // Boundary: exactly 7.00 fires.
        assert!(evaluate("btc", 7.0, 7.0).is_some());
        assert!(evaluate("btc", -7.0, 7.0).is_some());
    }

    #[test]
    fn test_silent_below_threshold() {
        assert!(evaluate("btc", 6.99, 7.0).is_none());
        assert!(evaluate("btc", -6.99, 7.0).is_none());
        assert!(evaluate("btc", 0.0, 7.0).is_none());
    }

    #[test]
    fn test_upward_alert_wording() {
        let alert = evaluate("btc", 8.25, 7.0).unwrap();

        assert_eq!(alert.title, "BTC ↑ 8.25 %");
        assert!(alert.body.contains("BTC"));
        assert!(alert.body.contains("8.25 %"));
    }

    #[test]
    fn test_downward_alert_wording() {
        let alert = evaluate("sol", -12.5, 7.0).unwrap();

        assert_eq!(alert.title, "SOL ↓ -12.50 %");
        assert!(alert.body.contains("-12.50 %"));
    }
}
