//! User directory access
//!
//! The account subsystem owns this table; the realtime core reads it to
//! resolve identities and push-delivery addresses, and writes only the
//! push token a client registers for itself.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::entities::user::User;
use crate::types::StoreResult;
use crate::StoreError;

pub async fn find_by_id(pool: &SqlitePool, user_id: i64) -> StoreResult<User> {
    sqlx::query_as::<_, User>(
        "SELECT id, public_id, name, phone, push_token, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound)
}

pub async fn exists(pool: &SqlitePool, user_id: i64) -> StoreResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// The recipient's push-delivery address, if one is registered.
pub async fn push_token(pool: &SqlitePool, user_id: i64) -> StoreResult<Option<String>> {
    let token: Option<Option<String>> =
        sqlx::query_scalar("SELECT push_token FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    token.ok_or(StoreError::NotFound)
}

pub async fn set_push_token(
    pool: &SqlitePool,
    user_id: i64,
    token: Option<&str>,
) -> StoreResult<()> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query("UPDATE users SET push_token = ?, updated_at = ? WHERE id = ?")
        .bind(token)
        .bind(&now)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

/// Insert a user row. The production writer is the account service; this
/// exists for seeding and tests.
pub async fn create(
    pool: &SqlitePool,
    public_id: &str,
    name: &str,
    phone: Option<&str>,
) -> StoreResult<i64> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO users (public_id, name, phone, push_token, created_at, updated_at) VALUES (?, ?, ?, NULL, ?, ?)",
    )
    .bind(public_id)
    .bind(name)
    .bind(phone)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_pool;

    #[tokio::test]
    async fn push_token_round_trip() {
        let pool = create_test_pool().await;
        let user_id = create(&pool, "pub-ada", "Ada", None).await.unwrap();

        assert_eq!(push_token(&pool, user_id).await.unwrap(), None);

        set_push_token(&pool, user_id, Some("ExponentPushToken[abc]"))
            .await
            .unwrap();
        assert_eq!(
            push_token(&pool, user_id).await.unwrap(),
            Some("ExponentPushToken[abc]".to_string())
        );

        set_push_token(&pool, user_id, None).await.unwrap();
        assert_eq!(push_token(&pool, user_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn find_by_id_unknown_user_is_not_found() {
        let pool = create_test_pool().await;
        let err = find_by_id(&pool, 999).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn set_push_token_unknown_user_is_not_found() {
        let pool = create_test_pool().await;
        let err = set_push_token(&pool, 999, Some("tok")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
