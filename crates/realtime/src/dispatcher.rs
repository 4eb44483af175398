//! Durable notification fan-out with best-effort push.

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use hearth_database::repos::{notifications, users};
use hearth_database::types::StoreResult;
use hearth_database::{Message, Notification, NotificationType};

use crate::push::{PushGateway, PushMessage};

/// Persists notifications and attempts push delivery for each recipient.
///
/// The persist is the contract; the push is an attempt. Per recipient the
/// two stay in order (no push before the durable record exists), distinct
/// recipients are dispatched concurrently, and every push attempt is
/// time-bounded so one slow endpoint cannot stall the rest.
#[derive(Clone)]
pub struct NotificationDispatcher {
    pool: SqlitePool,
    gateway: Arc<dyn PushGateway>,
    push_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(pool: SqlitePool, gateway: Arc<dyn PushGateway>, push_timeout: Duration) -> Self {
        Self {
            pool,
            gateway,
            push_timeout,
        }
    }

    /// Persist one notification, then try to push it. Push failure and
    /// push timeout degrade delivery but never the result.
    pub async fn notify(
        &self,
        recipient: i64,
        kind: NotificationType,
        title: &str,
        body: &str,
        payload: serde_json::Value,
    ) -> StoreResult<Notification> {
        let record =
            notifications::create(&self.pool, recipient, kind, &payload.to_string()).await?;

        match users::push_token(&self.pool, recipient).await {
            Ok(Some(token)) => {
                let message = PushMessage::new(token, title, body, payload);
                match tokio::time::timeout(self.push_timeout, self.gateway.deliver(&message)).await
                {
                    Ok(Ok(())) => debug!(recipient, "push delivered"),
                    Ok(Err(err)) => warn!(recipient, error = %err, "push delivery degraded"),
                    Err(_) => warn!(recipient, "push attempt timed out"),
                }
            }
            Ok(None) => debug!(recipient, "no push token registered"),
            Err(err) => warn!(recipient, error = %err, "push token lookup failed"),
        }

        Ok(record)
    }

    /// Notify every offline recipient of a new message. Recipients run
    /// concurrently; a failure for one is logged and does not affect the
    /// others.
    pub async fn dispatch_message(&self, message: &Message, sender_name: &str, recipients: &[i64]) {
        let mut tasks = JoinSet::new();

        for &recipient in recipients {
            let dispatcher = self.clone();
            let sender_name = sender_name.to_string();
            let payload = serde_json::json!({
                "group_id": message.group_id,
                "message_id": message.id,
                "sender_id": message.sender_id,
            });

            tasks.spawn(async move {
                let body = format!("{sender_name} sent a message");
                if let Err(err) = dispatcher
                    .notify(recipient, NotificationType::Message, "New message", &body, payload)
                    .await
                {
                    warn!(recipient, error = %err, "notification dispatch failed");
                }
            });
        }

        while tasks.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::PushError;
    use async_trait::async_trait;
    use chrono::Utc;
    use hearth_config::DatabaseConfig;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingGateway {
        sent: Mutex<Vec<PushMessage>>,
    }

    #[async_trait]
    impl PushGateway for RecordingGateway {
        async fn deliver(&self, message: &PushMessage) -> Result<(), PushError> {
            self.sent.lock().await.push(message.clone());
            Ok(())
        }
    }

    struct FailingGateway;

    #[async_trait]
    impl PushGateway for FailingGateway {
        async fn deliver(&self, _message: &PushMessage) -> Result<(), PushError> {
            Err(PushError::Status(reqwest::StatusCode::BAD_GATEWAY))
        }
    }

    async fn test_pool() -> SqlitePool {
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            max_connections: 1,
        };
        hearth_database::initialize_database(&config)
            .await
            .expect("in-memory database should initialize")
    }

    fn message(group_id: i64, sender_id: i64) -> Message {
        Message {
            id: 1,
            group_id,
            sender_id,
            content: Some("hello".to_string()),
            attachment_ref: None,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn notify_persists_before_pushing() {
        let pool = test_pool().await;
        let recipient = users::create(&pool, "pub-1", "Ada", None).await.unwrap();
        users::set_push_token(&pool, recipient, Some("ExponentPushToken[a]"))
            .await
            .unwrap();

        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher =
            NotificationDispatcher::new(pool.clone(), gateway.clone(), Duration::from_secs(2));

        let record = dispatcher
            .notify(
                recipient,
                NotificationType::Message,
                "New message",
                "Bob sent a message",
                serde_json::json!({ "group_id": 7 }),
            )
            .await
            .unwrap();

        assert!(!record.read);
        assert_eq!(notifications::unread_count(&pool, recipient).await.unwrap(), 1);

        let sent = gateway.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ExponentPushToken[a]");
        assert_eq!(sent[0].body, "Bob sent a message");
    }

    #[tokio::test]
    async fn push_failure_still_persists_the_notification() {
        let pool = test_pool().await;
        let recipient = users::create(&pool, "pub-1", "Ada", None).await.unwrap();
        users::set_push_token(&pool, recipient, Some("ExponentPushToken[a]"))
            .await
            .unwrap();

        let dispatcher =
            NotificationDispatcher::new(pool.clone(), Arc::new(FailingGateway), Duration::from_secs(2));

        dispatcher
            .notify(
                recipient,
                NotificationType::Message,
                "New message",
                "Bob sent a message",
                serde_json::json!({}),
            )
            .await
            .expect("push failure must not surface");

        assert_eq!(notifications::unread_count(&pool, recipient).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn recipients_without_tokens_get_no_push() {
        let pool = test_pool().await;
        let with_token = users::create(&pool, "pub-1", "Ada", None).await.unwrap();
        let without_token = users::create(&pool, "pub-2", "Bob", None).await.unwrap();
        users::set_push_token(&pool, with_token, Some("ExponentPushToken[a]"))
            .await
            .unwrap();

        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher =
            NotificationDispatcher::new(pool.clone(), gateway.clone(), Duration::from_secs(2));

        dispatcher
            .dispatch_message(&message(7, 99), "Carol", &[with_token, without_token])
            .await;

        assert_eq!(notifications::unread_count(&pool, with_token).await.unwrap(), 1);
        assert_eq!(notifications::unread_count(&pool, without_token).await.unwrap(), 1);
        assert_eq!(gateway.sent.lock().await.len(), 1);
    }
}
