//! Message entity definitions

use serde::{Deserialize, Serialize};

/// A durable group message. Immutable once created; the id is assigned by
/// the store and is monotonic, so it doubles as the per-group ordinal the
/// broadcast order contract relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub group_id: i64,
    pub sender_id: i64,
    pub content: Option<String>,
    pub attachment_ref: Option<String>,
    pub created_at: String,
}

/// The client-supplied part of a message: text and/or an attachment
/// reference, at least one of which must be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    pub text: Option<String>,
    pub attachment_ref: Option<String>,
}

impl MessageBody {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            attachment_ref: None,
        }
    }

    /// A body is empty when it carries neither non-blank text nor a
    /// non-blank attachment reference.
    pub fn is_empty(&self) -> bool {
        let has_text = self
            .text
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false);
        let has_attachment = self
            .attachment_ref
            .as_deref()
            .map(|a| !a.trim().is_empty())
            .unwrap_or(false);
        !has_text && !has_attachment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_with_text_only_is_not_empty() {
        assert!(!MessageBody::text("hello").is_empty());
    }

    #[test]
    fn body_with_attachment_only_is_not_empty() {
        let body = MessageBody {
            text: None,
            attachment_ref: Some("uploads/plan.png".to_string()),
        };
        assert!(!body.is_empty());
    }

    #[test]
    fn blank_text_and_missing_attachment_is_empty() {
        let body = MessageBody {
            text: Some("   ".to_string()),
            attachment_ref: None,
        };
        assert!(body.is_empty());
        assert!(MessageBody::default().is_empty());
    }
}
