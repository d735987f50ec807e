use crate::alert::Alert;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, alert: &Alert) -> Result<()>;
}
