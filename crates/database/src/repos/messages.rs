//! Message store access
//!
//! Append-only. The assigned rowid is the message ordinal: broadcast
//! order must match append order, so callers append first and fan out
//! second.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::entities::message::{Message, MessageBody};
use crate::types::StoreResult;
use crate::StoreError;

const MESSAGE_COLUMNS: &str = "id, group_id, sender_id, content, attachment_ref, created_at";

/// Durably append a message, assigning its id and timestamp.
pub async fn append(
    pool: &SqlitePool,
    group_id: i64,
    sender_id: i64,
    body: &MessageBody,
) -> StoreResult<Message> {
    if body.is_empty() {
        return Err(StoreError::Validation(
            "message must have either text or an attachment".to_string(),
        ));
    }

    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO messages (group_id, sender_id, content, attachment_ref, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(group_id)
    .bind(sender_id)
    .bind(body.text.as_deref())
    .bind(body.attachment_ref.as_deref())
    .bind(&now)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();

    Ok(Message {
        id,
        group_id,
        sender_id,
        content: body.text.clone(),
        attachment_ref: body.attachment_ref.clone(),
        created_at: now,
    })
}

/// Recent history for a group, newest first. `before_id` pages backwards
/// through older messages (reconnect resynchronization).
pub async fn list_recent(
    pool: &SqlitePool,
    group_id: i64,
    limit: i64,
    before_id: Option<i64>,
) -> StoreResult<Vec<Message>> {
    let messages = if let Some(before) = before_id {
        sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE group_id = ? AND id < ? ORDER BY id DESC LIMIT ?",
        ))
        .bind(group_id)
        .bind(before)
        .bind(limit)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE group_id = ? ORDER BY id DESC LIMIT ?",
        ))
        .bind(group_id)
        .bind(limit)
        .fetch_all(pool)
        .await?
    };

    Ok(messages)
}
