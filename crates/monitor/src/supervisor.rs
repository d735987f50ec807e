//! Stream lifecycle supervision.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One connection lifecycle of a streaming client.
///
/// `run_once` performs its own setup (discovery, connect, subscribe) so
/// every supervised attempt starts from a fresh view of the world.
#[async_trait]
pub trait StreamSession: Send {
    async fn run_once(&mut self) -> anyhow::Result<()>;
}

/// Restarts a stream session after a fixed delay, forever.
///
/// There is no retry cap: availability is preferred over surfacing the
/// failure, and every exit path degrades to "reconnect and resubscribe".
pub struct ReconnectSupervisor {
    delay: Duration,
    should_stop: Arc<AtomicBool>,
}

impl ReconnectSupervisor {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            should_stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a handle to signal the supervisor to stop.
    #[must_use]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.should_stop)
    }

    fn stopped(&self) -> bool {
        self.should_stop.load(Ordering::SeqCst)
    }

    /// Drives the session until stopped.
    pub async fn supervise<S: StreamSession>(&self, session: &mut S) {
        loop {
            if self.stopped() {
                tracing::info!("stream supervisor stopping on request");
                return;
            }

            match session.run_once().await {
                Ok(()) => tracing::info!("stream session ended"),
                Err(e) => tracing::warn!(error = %e, "stream session failed"),
            }

            if self.stopped() {
                tracing::info!("stream supervisor stopping on request");
                return;
            }
            tracing::info!(delay = ?self.delay, "reconnecting after delay");
            tokio::time::sleep(self.delay).await;
        }
    }
}
