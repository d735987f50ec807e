//! Large-liquidation detection over the public trade stream.
//!
//! One session discovers the current linear instrument set, subscribes to
//! every `publicTrade` channel in capped batches, and evaluates each trade's
//! notional value against the alert threshold. The reconnect policy lives in
//! the supervisor; a session only runs one connection to completion.

use crate::catalog::QUOTE_CURRENCY;
use crate::supervisor::StreamSession;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use vigil_bybit::{BybitClient, BybitWebSocket, Instrument, InstrumentCategory};
use vigil_core::{Alert, AlertDispatcher};

/// Transport limit on channel names per subscribe frame.
pub const MAX_CHANNELS_PER_SUBSCRIBE: usize = 250;

/// Aggressor side of a trade.
///
/// "Buy" denotes a short position forcibly closed, "Sell" a long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// One trade from a `publicTrade` frame.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeTick {
    #[serde(rename = "s")]
    pub pair: String,
    #[serde(rename = "p")]
    pub price: String,
    #[serde(rename = "v")]
    pub size: String,
    #[serde(rename = "S")]
    pub side: Side,
}

impl TradeTick {
    /// USD value of the trade, or `None` when price or size is not numeric.
    pub fn notional(&self) -> Option<f64> {
        let price: f64 = self.price.parse().ok()?;
        let size: f64 = self.size.parse().ok()?;
        Some(price * size)
    }
}

/// Lifecycle of the streaming connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Subscribed,
    Closed,
}

/// Counters for a running stream.
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    /// Total frames received.
    pub frames_received: u64,
    /// Frames or trade entries that failed to parse.
    pub parse_errors: u64,
    /// Alerts emitted.
    pub alerts_emitted: u64,
}

pub struct LiquidationStream {
    bybit: Arc<BybitClient>,
    ws_url: String,
    dispatcher: AlertDispatcher,
    min_notional_usd: f64,
    state: ConnectionState,
    stats: StreamStats,
    should_stop: Arc<AtomicBool>,
}

impl LiquidationStream {
    pub fn new(
        bybit: Arc<BybitClient>,
        ws_url: String,
        dispatcher: AlertDispatcher,
        min_notional_usd: f64,
    ) -> Self {
        Self {
            bybit,
            ws_url,
            dispatcher,
            min_notional_usd,
            state: ConnectionState::Disconnected,
            stats: StreamStats::default(),
            should_stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares a stop handle so the stream exits at its next message.
    #[must_use]
    pub fn with_stop_handle(mut self, stop: Arc<AtomicBool>) -> Self {
        self.should_stop = stop;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Rebuilds the channel set from the live instrument list.
    async fn fetch_channels(&self) -> anyhow::Result<Vec<String>> {
        let instruments = self.bybit.instruments(InstrumentCategory::Linear).await?;
        Ok(build_channels(&instruments, QUOTE_CURRENCY))
    }

    async fn stream(&mut self) -> anyhow::Result<()> {
        self.state = ConnectionState::Connecting;

        let channels = self.fetch_channels().await?;
        tracing::info!(channels = channels.len(), "subscribing to public trade channels");

        let mut ws = BybitWebSocket::new(self.ws_url.clone());
        ws.connect().await?;
        for batch in batch_channels(&channels, MAX_CHANNELS_PER_SUBSCRIBE) {
            ws.subscribe(batch).await?;
        }
        self.state = ConnectionState::Subscribed;

        loop {
            if self.should_stop.load(Ordering::SeqCst) {
                tracing::info!("liquidation stream stopping on request");
                return Ok(());
            }
            match ws.next_text().await? {
                Some(text) => self.handle_frame(&text),
                None => break,
            }
        }

        self.state = ConnectionState::Closed;
        anyhow::bail!("stream ended")
    }

    /// Handles one inbound frame. Non-trade frames (pings, subscription
    /// acks) are ignored; malformed content is counted and logged without
    /// touching the connection.
    fn handle_frame(&mut self, text: &str) {
        self.stats.frames_received += 1;

        let value: serde_json::Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                self.stats.parse_errors += 1;
                tracing::warn!(error = %e, "unparseable stream frame");
                return;
            }
        };

        let Some(trades) = value.get("data").and_then(|d| d.as_array()) else {
            return;
        };

        for raw in trades {
            let tick: TradeTick = match serde_json::from_value(raw.clone()) {
                Ok(tick) => tick,
                Err(e) => {
                    self.stats.parse_errors += 1;
                    tracing::warn!(error = %e, "malformed trade entry");
                    continue;
                }
            };

            if tick.notional().is_none() {
                self.stats.parse_errors += 1;
                tracing::warn!(pair = %tick.pair, "non-numeric price or size in trade");
                continue;
            }

            if let Some(alert) = evaluate_trade(&tick, self.min_notional_usd) {
                self.stats.alerts_emitted += 1;
                self.dispatcher.dispatch(alert);
            }
        }
    }
}

#[async_trait]
impl StreamSession for LiquidationStream {
    async fn run_once(&mut self) -> anyhow::Result<()> {
        let result = self.stream().await;
        if result.is_err() {
            self.state = ConnectionState::Closed;
        }
        result
    }
}

/// Builds one `publicTrade` channel name per instrument quoted in `quote`.
pub fn build_channels(instruments: &[Instrument], quote: &str) -> Vec<String> {
    instruments
        .iter()
        .filter(|i| i.symbol.ends_with(quote))
        .map(|i| format!("publicTrade.{}", i.symbol))
        .collect()
}

/// Partitions channel names into subscribe-frame batches of at most `max`.
pub fn batch_channels(channels: &[String], max: usize) -> std::slice::Chunks<'_, String> {
    channels.chunks(max.max(1))
}

/// Alert decision: fires iff `size * price >= min_notional_usd`.
pub fn evaluate_trade(tick: &TradeTick, min_notional_usd: f64) -> Option<Alert> {
    let notional = tick.notional()?;
    if notional < min_notional_usd {
        return None;
    }

    let direction = match tick.side {
        Side::Buy => "Shorts liquidated",
        Side::Sell => "Longs liquidated",
    };
    Some(Alert::new(
        format!("Liquidation {}", tick.pair),
        format!(
            "{direction}: {} USD on {} at {}",
            format_usd(notional),
            tick.pair,
            tick.price
        ),
    ))
}

/// Formats a USD amount with thousands separators, no decimals.
fn format_usd(value: f64) -> String {
    let formatted = format!("{value:.0}");
    let (sign, digits) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };

    let with_commas: String = digits
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    format!("{sign}{with_commas}")
}
