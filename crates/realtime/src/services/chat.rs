//! Message acceptance and history.

use sqlx::SqlitePool;

use hearth_database::repos::{memberships, messages};
use hearth_database::{Message, MessageBody};

use crate::error::ServiceError;

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 100;

/// Accept a message: validate, re-check membership against the directory,
/// then durably append. The caller broadcasts and dispatches notifications
/// only after this returns, so nothing is ever announced that is not
/// already stored.
pub async fn send_message(
    pool: &SqlitePool,
    group_id: i64,
    sender_id: i64,
    body: &MessageBody,
) -> Result<Message, ServiceError> {
    if body.is_empty() {
        return Err(ServiceError::Validation(
            "message must have either text or an attachment".to_string(),
        ));
    }

    if !memberships::is_member(pool, group_id, sender_id).await? {
        return Err(ServiceError::Membership);
    }

    let message = messages::append(pool, group_id, sender_id, body).await?;
    Ok(message)
}

/// Recent history for reconnect resynchronization, newest first.
pub async fn recent_messages(
    pool: &SqlitePool,
    group_id: i64,
    requester: i64,
    limit: Option<i64>,
    before_id: Option<i64>,
) -> Result<Vec<Message>, ServiceError> {
    if !memberships::is_member(pool, group_id, requester).await? {
        return Err(ServiceError::Membership);
    }

    let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);
    let messages = messages::list_recent(pool, group_id, limit, before_id).await?;
    Ok(messages)
}
