//! Pushbullet notification channel.
//!
//! Best-effort delivery: the daemon dispatches through
//! `vigil_core::AlertDispatcher`, which logs failures and never retries.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use vigil_core::{Alert, AlertSink};

/// Errors from the Pushbullet channel.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Transport or decode failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Pushbullet rejected the request.
    #[error("push rejected with status {0}")]
    Rejected(u16),
}

/// A registered Pushbullet device.
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    pub iden: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Deserialize)]
struct DeviceList {
    #[serde(default)]
    devices: Vec<Device>,
}

pub struct PushbulletNotifier {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl PushbulletNotifier {
    pub fn new(api_url: String, token: String) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            api_url,
            token,
        }
    }

    /// Lists the account's registered devices.
    ///
    /// # Errors
    /// Returns an error if the request fails or is rejected.
    pub async fn devices(&self) -> Result<Vec<Device>, NotifyError> {
        let url = format!("{}/v2/devices", self.api_url);
        let response = self
            .http
            .get(&url)
            .header("Access-Token", &self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }

        let list: DeviceList = response.json().await?;
        Ok(list.devices)
    }

    async fn push_note(&self, alert: &Alert) -> Result<(), NotifyError> {
        let url = format!("{}/v2/pushes", self.api_url);
        let body = serde_json::json!({
            "type": "note",
            "title": alert.title,
            "body": alert.body,
        });

        let response = self
            .http
            .post(&url)
            .header("Access-Token", &self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl AlertSink for PushbulletNotifier {
    async fn deliver(&self, alert: &Alert) -> anyhow::Result<()> {
        self.push_note(alert).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_list() {
        let json = r#"{
            "devices": [
                {"iden": "abc123", "nickname": "Pixel", "active": true},
                {"iden": "def456", "active": false}
            ]
        }"#;

        let list: DeviceList = serde_json::from_str(json).unwrap();

        assert_eq!(list.devices.len(), 2);
        assert_eq!(list.devices[0].iden, "abc123");
        assert_eq!(list.devices[0].nickname.as_deref(), Some("Pixel"));
        assert!(list.devices[0].active);
        assert!(list.devices[1].nickname.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        // Nothing listens on this port; delivery fails without panicking.
        let notifier =
            PushbulletNotifier::new("http://127.0.0.1:9".to_string(), "token".to_string());

        let alert = Alert::new("t", "b");
        assert!(notifier.deliver(&alert).await.is_err());
    }

    #[tokio::test]
    #[ignore = "requires network and a real Pushbullet token"]
    async fn test_list_devices() {
        let token = std::env::var("VIGIL_PUSHBULLET__TOKEN").unwrap();
        let notifier = PushbulletNotifier::new("https://api.pushbullet.com".to_string(), token);

        let devices = notifier.devices().await.unwrap();
        assert!(!devices.is_empty());
    }
}
