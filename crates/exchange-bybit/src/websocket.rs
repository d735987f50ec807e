//! Bybit V5 public WebSocket client.
//!
//! Thin connection wrapper: the caller owns subscription contents and the
//! reconnect policy; this type only speaks the wire protocol (subscribe
//! frames, heartbeat pings, frame classification).

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use url::Url;

/// Bybit expects a client heartbeat at least every 20 seconds.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);

/// Errors from the WebSocket transport.
#[derive(Error, Debug)]
pub enum StreamError {
    /// Malformed endpoint URL.
    #[error("invalid WebSocket URL: {0}")]
    Url(#[from] url::ParseError),

    /// Transport-level failure.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Server closed the connection.
    #[error("connection closed: {0}")]
    Closed(String),

    /// Operation attempted before `connect`.
    #[error("WebSocket not connected")]
    NotConnected,
}

pub struct BybitWebSocket {
    ws_url: String,
    stream: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    last_ping: std::time::Instant,
}

impl BybitWebSocket {
    #[must_use]
    pub fn new(ws_url: String) -> Self {
        Self {
            ws_url,
            stream: None,
            last_ping: std::time::Instant::now(),
        }
    }

    /// Connects to the WebSocket server.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the server is unreachable.
    pub async fn connect(&mut self) -> Result<(), StreamError> {
        let url = Url::parse(&self.ws_url)?;
        tracing::debug!(url = %url, "connecting to Bybit stream");

        let (ws_stream, response) = connect_async(url.as_str()).await?;
        self.stream = Some(ws_stream);
        self.last_ping = std::time::Instant::now();
        tracing::info!(url = %self.ws_url, status = %response.status(), "WebSocket connected");
        Ok(())
    }

    /// Sends one subscribe frame carrying the given channel names.
    ///
    /// # Errors
    /// Returns an error if not connected or the send fails.
    pub async fn subscribe(&mut self, channels: &[String]) -> Result<(), StreamError> {
        let stream = self.stream.as_mut().ok_or(StreamError::NotConnected)?;
        let frame = serde_json::json!({
            "op": "subscribe",
            "args": channels,
        });
        stream.send(Message::Text(frame.to_string())).await?;
        tracing::debug!(channels = channels.len(), "sent subscribe frame");
        Ok(())
    }

    /// Receives the next text payload, transparently handling pings.
    ///
    /// Returns `Ok(None)` when the stream ends without a close frame.
    ///
    /// # Errors
    /// Returns an error if not connected, on transport failure, or when the
    /// server closes the connection.
    pub async fn next_text(&mut self) -> Result<Option<String>, StreamError> {
        loop {
            if self.last_ping.elapsed() > HEARTBEAT_INTERVAL {
                self.send_ping().await?;
            }

            let stream = self.stream.as_mut().ok_or(StreamError::NotConnected)?;
            let Some(msg) = stream.next().await else {
                return Ok(None);
            };

            match msg? {
                Message::Text(text) => return Ok(Some(text)),
                Message::Ping(_) | Message::Pong(_) => {
                    tracing::trace!("heartbeat frame");
                }
                Message::Close(frame) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    return Err(StreamError::Closed(reason));
                }
                _ => {}
            }
        }
    }

    async fn send_ping(&mut self) -> Result<(), StreamError> {
        let stream = self.stream.as_mut().ok_or(StreamError::NotConnected)?;
        let frame = serde_json::json!({"op": "ping"});
        stream.send(Message::Text(frame.to_string())).await?;
        self.last_ping = std::time::Instant::now();
        tracing::trace!("sent heartbeat ping");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_before_connect_fails() {
        let mut ws = BybitWebSocket::new("wss://stream.bybit.com/v5/public/linear".to_string());
        let channels = vec!["publicTrade.BTCUSDT".to_string()];

        let err = ws.subscribe(&channels).await.unwrap_err();
        assert!(matches!(err, StreamError::NotConnected));
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_url() {
        let mut ws = BybitWebSocket::new("not a url".to_string());

        let err = ws.connect().await.unwrap_err();
        assert!(matches!(err, StreamError::Url(_)));
    }

    #[tokio::test]
    #[ignore = "requires network connection to Bybit"]
    async fn test_connect_and_subscribe() {
        let mut ws = BybitWebSocket::new("wss://stream.bybit.com/v5/public/linear".to_string());
        ws.connect().await.unwrap();
        ws.subscribe(&["publicTrade.BTCUSDT".to_string()])
            .await
            .unwrap();

        // The first frame back is the subscription ack.
        let text = ws.next_text().await.unwrap();
        assert!(text.is_some());
    }
}
