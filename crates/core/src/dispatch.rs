use crate::alert::Alert;
use crate::traits::AlertSink;
use std::sync::Arc;

/// Fire-and-forget alert delivery.
///
/// Each dispatched alert is handed to a spawned task whose only completion
/// handling is logging; delivery failures are never retried and never reach
/// the originating check.
#[derive(Clone)]
pub struct AlertDispatcher {
    sink: Arc<dyn AlertSink>,
}

impl AlertDispatcher {
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        Self { sink }
    }

    pub fn dispatch(&self, alert: Alert) {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            match sink.deliver(&alert).await {
                Ok(()) => tracing::info!(title = %alert.title, "alert delivered"),
                Err(e) => {
                    tracing::warn!(title = %alert.title, error = %e, "alert delivery failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct ChannelSink {
        tx: mpsc::UnboundedSender<Alert>,
    }

    #[async_trait]
    impl AlertSink for ChannelSink {
        async fn deliver(&self, alert: &Alert) -> Result<()> {
            self.tx.send(alert.clone()).ok();
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl AlertSink for FailingSink {
        async fn deliver(&self, _alert: &Alert) -> Result<()> {
            anyhow::bail!("channel rejected the push")
        }
    }

    #[tokio::test]
    async fn test_dispatch_delivers_to_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = AlertDispatcher::new(Arc::new(ChannelSink { tx }));

        dispatcher.dispatch(Alert::new("BTC alert", "something moved"));

        let delivered = rx.recv().await.unwrap();
        assert_eq!(delivered.title, "BTC alert");
        assert_eq!(delivered.body, "something moved");
    }

    #[tokio::test]
    async fn test_dispatch_swallows_delivery_failure() {
        let dispatcher = AlertDispatcher::new(Arc::new(FailingSink));

        // Must not panic or propagate; the spawned task logs and exits.
        dispatcher.dispatch(Alert::new("t", "b"));
        tokio::task::yield_now().await;
    }
}
