use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bybit: BybitConfig,
    pub coingecko: CoinGeckoConfig,
    pub pushbullet: PushbulletConfig,
    pub alerts: AlertConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BybitConfig {
    pub api_url: String,
    pub ws_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinGeckoConfig {
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushbulletConfig {
    pub api_url: String,
    /// Access token; supply via `VIGIL_PUSHBULLET__TOKEN`.
    pub token: String,
}

/// Alert thresholds, set once at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Absolute 1-hour price change (percent) that triggers a variation alert.
    pub variation_pct: f64,
    /// Funding rate (fraction) below which a funding alert fires.
    pub funding_rate: f64,
    /// Minimum liquidation notional (USD) that triggers a liquidation alert.
    pub min_liquidation_usd: f64,
    /// Minutes between polling cycles.
    pub poll_interval_minutes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bybit: BybitConfig::default(),
            coingecko: CoinGeckoConfig::default(),
            pushbullet: PushbulletConfig::default(),
            alerts: AlertConfig::default(),
        }
    }
}

impl Default for BybitConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.bybit.com".to_string(),
            ws_url: "wss://stream.bybit.com/v5/public/linear".to_string(),
        }
    }
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.coingecko.com".to_string(),
        }
    }
}

impl Default for PushbulletConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.pushbullet.com".to_string(),
            token: String::new(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            variation_pct: 7.0,
            funding_rate: -0.0005,
            min_liquidation_usd: 500_000.0,
            poll_interval_minutes: 5,
        }
    }
}
