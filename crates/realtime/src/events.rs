//! Wire events exchanged over a live session.

use serde::{Deserialize, Serialize};

use hearth_database::Message;

/// Events a connected client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Join {
        group_id: i64,
    },
    Leave {
        group_id: i64,
    },
    Send {
        group_id: i64,
        content: Option<String>,
        attachment_ref: Option<String>,
    },
    Ping,
}

/// Events the server enqueues towards a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Hello {
        session_id: String,
        user_id: i64,
    },
    Joined {
        group_id: i64,
    },
    Left {
        group_id: i64,
    },
    Message {
        id: i64,
        group_id: i64,
        sender_id: i64,
        content: Option<String>,
        attachment_ref: Option<String>,
        created_at: String,
    },
    Pong,
    /// The session's outbound queue overflowed and events were dropped.
    /// The client must refetch history before trusting its local view.
    ResyncRequired,
    Error {
        code: String,
        message: String,
    },
}

impl ServerEvent {
    pub fn from_message(message: &Message) -> Self {
        ServerEvent::Message {
            id: message.id,
            group_id: message.group_id,
            sender_id: message.sender_id,
            content: message.content.clone(),
            attachment_ref: message.attachment_ref.clone(),
            created_at: message.created_at.clone(),
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Whether this event may be dropped when a slow consumer overflows
    /// its queue. `resync_required` is the one event that must survive,
    /// otherwise the client never learns it fell behind.
    pub fn droppable(&self) -> bool {
        !matches!(self, ServerEvent::ResyncRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_events_use_snake_case_tags() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"join","group_id":7}"#).expect("should parse");
        assert_eq!(event, ClientEvent::Join { group_id: 7 });

        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"send","group_id":7,"content":"hi","attachment_ref":null}"#,
        )
        .expect("should parse");
        assert!(matches!(event, ClientEvent::Send { group_id: 7, .. }));
    }

    #[test]
    fn resync_is_the_only_non_droppable_event() {
        assert!(!ServerEvent::ResyncRequired.droppable());
        assert!(ServerEvent::Pong.droppable());
        assert!(ServerEvent::Joined { group_id: 1 }.droppable());
    }
}
