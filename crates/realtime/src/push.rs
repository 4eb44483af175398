//! Best-effort push delivery.
//!
//! Push is a courtesy channel: the durable notification row is the
//! record, the push is an attempt to surface it sooner. Callers log
//! failures and move on; nothing here may fail a message send.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use hearth_config::PushConfig;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("push request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("push endpoint returned {0}")]
    Status(StatusCode),
}

/// Expo push request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub sound: String,
    pub priority: String,
}

impl PushMessage {
    pub fn new(
        to: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            to: to.into(),
            title: title.into(),
            body: body.into(),
            data,
            sound: "default".to_string(),
            priority: "high".to_string(),
        }
    }
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn deliver(&self, message: &PushMessage) -> Result<(), PushError>;
}

/// Talks to an Expo-compatible push endpoint over HTTPS. The response
/// body is not inspected; a non-success status is the only failure
/// signal beyond the transport itself.
pub struct ExpoPushClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ExpoPushClient {
    pub fn from_config(config: &PushConfig) -> Result<Self, PushError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl PushGateway for ExpoPushClient {
    async fn deliver(&self, message: &PushMessage) -> Result<(), PushError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(message)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PushError::Status(response.status()));
        }

        debug!(to = %message.to, "push accepted by endpoint");
        Ok(())
    }
}

/// Used when push is disabled in configuration.
pub struct NoopPushGateway;

#[async_trait]
impl PushGateway for NoopPushGateway {
    async fn deliver(&self, message: &PushMessage) -> Result<(), PushError> {
        debug!(to = %message.to, "push disabled, dropping message");
        Ok(())
    }
}
