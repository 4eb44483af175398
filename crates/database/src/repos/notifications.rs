//! Durable notification store access
//!
//! Every mutation is scoped to the recipient: a caller can only flip or
//! delete notifications addressed to them. `NotRecipient` is returned
//! when a row exists but belongs to someone else, so callers can map it
//! to an authorization refusal rather than a 404.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::entities::notification::{Notification, NotificationType};
use crate::types::StoreResult;
use crate::StoreError;

const NOTIFICATION_COLUMNS: &str = "id, user_id, type, payload, read, created_at";

pub async fn create(
    pool: &SqlitePool,
    user_id: i64,
    notification_type: NotificationType,
    payload: &str,
) -> StoreResult<Notification> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO notifications (user_id, type, payload, read, created_at) VALUES (?, ?, ?, 0, ?)",
    )
    .bind(user_id)
    .bind(notification_type.as_str())
    .bind(payload)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(Notification {
        id: result.last_insert_rowid(),
        user_id,
        notification_type: notification_type.as_str().to_string(),
        payload: payload.to_string(),
        read: false,
        created_at: now,
    })
}

/// One page of the recipient's notifications, newest first, plus the
/// total count. Both reads run inside one transaction so the page and
/// the total describe the same snapshot.
pub async fn list_page(
    pool: &SqlitePool,
    user_id: i64,
    page: i64,
    limit: i64,
) -> StoreResult<(Vec<Notification>, i64)> {
    let offset = (page - 1).max(0) * limit;

    let mut tx = pool.begin().await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    let notifications = sqlx::query_as::<_, Notification>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = ? ORDER BY id DESC LIMIT ? OFFSET ?",
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((notifications, total))
}

pub async fn unread_count(pool: &SqlitePool, user_id: i64) -> StoreResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND read = 0")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Mark one notification read. Idempotent: marking an already-read
/// notification succeeds. Fails with `NotRecipient` when the row belongs
/// to another user.
pub async fn mark_read(pool: &SqlitePool, notification_id: i64, requester: i64) -> StoreResult<()> {
    let owner: Option<i64> = sqlx::query_scalar("SELECT user_id FROM notifications WHERE id = ?")
        .bind(notification_id)
        .fetch_optional(pool)
        .await?;

    match owner {
        None => Err(StoreError::NotFound),
        Some(user_id) if user_id != requester => Err(StoreError::NotRecipient),
        Some(_) => {
            sqlx::query("UPDATE notifications SET read = 1 WHERE id = ?")
                .bind(notification_id)
                .execute(pool)
                .await?;
            Ok(())
        }
    }
}

/// Mark every unread notification for the recipient read. Returns the
/// number of rows flipped.
pub async fn mark_all_read(pool: &SqlitePool, user_id: i64) -> StoreResult<u64> {
    let result = sqlx::query("UPDATE notifications SET read = 1 WHERE user_id = ? AND read = 0")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &SqlitePool, notification_id: i64, requester: i64) -> StoreResult<()> {
    let owner: Option<i64> = sqlx::query_scalar("SELECT user_id FROM notifications WHERE id = ?")
        .bind(notification_id)
        .fetch_optional(pool)
        .await?;

    match owner {
        None => Err(StoreError::NotFound),
        Some(user_id) if user_id != requester => Err(StoreError::NotRecipient),
        Some(_) => {
            sqlx::query("DELETE FROM notifications WHERE id = ?")
                .bind(notification_id)
                .execute(pool)
                .await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_pool, insert_user};

    #[tokio::test]
    async fn pagination_is_newest_first_with_stable_total() {
        let pool = create_test_pool().await;
        let user = insert_user(&pool, "reader").await;

        for n in 1..=5 {
            create(&pool, user, NotificationType::Message, &format!("p{n}"))
                .await
                .unwrap();
        }

        let (page_one, total) = list_page(&pool, user, 1, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page_one[0].payload, "p5");
        assert_eq!(page_one[1].payload, "p4");

        let (page_three, total) = list_page(&pool, user, 3, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page_three.len(), 1);
        assert_eq!(page_three[0].payload, "p1");
    }

    #[tokio::test]
    async fn mark_read_is_idempotent() {
        let pool = create_test_pool().await;
        let user = insert_user(&pool, "reader").await;
        let n = create(&pool, user, NotificationType::Message, "hello")
            .await
            .unwrap();

        assert_eq!(unread_count(&pool, user).await.unwrap(), 1);
        mark_read(&pool, n.id, user).await.unwrap();
        mark_read(&pool, n.id, user).await.unwrap();
        assert_eq!(unread_count(&pool, user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn recipient_scoping_is_enforced() {
        let pool = create_test_pool().await;
        let owner = insert_user(&pool, "owner").await;
        let intruder = insert_user(&pool, "intruder").await;
        let n = create(&pool, owner, NotificationType::Message, "private")
            .await
            .unwrap();

        let err = mark_read(&pool, n.id, intruder).await.unwrap_err();
        assert!(matches!(err, StoreError::NotRecipient));

        let err = delete(&pool, n.id, intruder).await.unwrap_err();
        assert!(matches!(err, StoreError::NotRecipient));

        let err = mark_read(&pool, 999, owner).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn mark_all_read_flips_only_the_recipients_rows() {
        let pool = create_test_pool().await;
        let a = insert_user(&pool, "a").await;
        let b = insert_user(&pool, "b").await;
        create(&pool, a, NotificationType::Message, "one").await.unwrap();
        create(&pool, a, NotificationType::Message, "two").await.unwrap();
        create(&pool, b, NotificationType::Message, "other").await.unwrap();

        let flipped = mark_all_read(&pool, a).await.unwrap();
        assert_eq!(flipped, 2);
        assert_eq!(unread_count(&pool, a).await.unwrap(), 0);
        assert_eq!(unread_count(&pool, b).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let pool = create_test_pool().await;
        let user = insert_user(&pool, "reader").await;
        let n = create(&pool, user, NotificationType::Message, "bye")
            .await
            .unwrap();

        delete(&pool, n.id, user).await.unwrap();
        let (rest, total) = list_page(&pool, user, 1, 10).await.unwrap();
        assert!(rest.is_empty());
        assert_eq!(total, 0);
    }
}
