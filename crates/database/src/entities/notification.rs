//! Notification entity definitions

use serde::{Deserialize, Serialize};

/// A persisted notification. Mutated only to flip the read flag, by the
/// recipient; deleted only on explicit recipient request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: String,
    pub payload: String,
    pub read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NotificationType {
    Message,
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Message => "message",
            NotificationType::System => "system",
        }
    }
}

impl From<&str> for NotificationType {
    fn from(s: &str) -> Self {
        match s {
            "message" => NotificationType::Message,
            _ => NotificationType::System,
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
