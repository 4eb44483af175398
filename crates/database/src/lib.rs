//! Hearth database crate
//!
//! Connection management, migrations and repository functions for the
//! SQLite store backing the realtime core: the user directory, the group
//! membership directory, the message store and the notification store.

use sqlx::SqlitePool;

use hearth_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use migrations::run_migrations;

pub use entities::{
    message::{Message, MessageBody},
    notification::{Notification, NotificationType},
    user::User,
};

pub use types::errors::{DatabaseError, StoreError};
pub use types::StoreResult;

/// Prepare the connection pool and apply migrations.
pub async fn initialize_database(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    Ok(pool)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::Utc;

    pub async fn create_test_pool() -> SqlitePool {
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            max_connections: 1,
        };
        initialize_database(&config).await.unwrap()
    }

    pub async fn insert_user(pool: &SqlitePool, name: &str) -> i64 {
        repos::users::create(pool, &format!("pub-{name}"), name, Some("5550100"))
            .await
            .unwrap()
    }

    pub async fn insert_group(pool: &SqlitePool, name: &str, created_by: i64) -> i64 {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO groups (name, description, created_by, created_at) VALUES (?, NULL, ?, ?)",
        )
        .bind(name)
        .bind(created_by)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap();
        result.last_insert_rowid()
    }
}
