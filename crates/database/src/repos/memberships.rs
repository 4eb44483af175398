//! Group membership directory access
//!
//! Membership is read-mostly ground truth. Authorization decisions query
//! it fresh on every check, never a cached snapshot, since membership can
//! change while a session is connected.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::types::StoreResult;

pub async fn is_member(pool: &SqlitePool, group_id: i64, user_id: i64) -> StoreResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM group_members WHERE group_id = ? AND user_id = ?")
            .bind(group_id)
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

pub async fn member_ids(pool: &SqlitePool, group_id: i64) -> StoreResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT user_id FROM group_members WHERE group_id = ? ORDER BY user_id",
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

pub async fn add_member(pool: &SqlitePool, group_id: i64, user_id: i64) -> StoreResult<()> {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT OR IGNORE INTO group_members (group_id, user_id, joined_at) VALUES (?, ?, ?)",
    )
    .bind(group_id)
    .bind(user_id)
    .bind(&now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn remove_member(pool: &SqlitePool, group_id: i64, user_id: i64) -> StoreResult<()> {
    sqlx::query("DELETE FROM group_members WHERE group_id = ? AND user_id = ?")
        .bind(group_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
