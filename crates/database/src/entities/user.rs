//! User entity definitions

use serde::{Deserialize, Serialize};

/// A row from the user directory. Owned by the account subsystem; the
/// realtime core only reads it (identity, push-delivery address).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub public_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub push_token: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
