//! Room registry: which sessions are present in which group rooms.
//!
//! One lock guards the whole structure. Every operation takes it once,
//! so per-room membership and the session index can never disagree.
//! Invariant: a room entry exists iff its session set is non-empty.

use std::collections::{HashMap, HashSet};

use tokio::sync::Mutex;
use tracing::debug;

use crate::session::{SessionHandle, SessionId};

#[derive(Default)]
struct RegistryState {
    // group_id -> sessions present in that room
    rooms: HashMap<i64, HashSet<SessionId>>,
    sessions: HashMap<SessionId, SessionHandle>,
}

#[derive(Default)]
pub struct RoomRegistry {
    inner: Mutex<RegistryState>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, handle: SessionHandle) {
        let mut state = self.inner.lock().await;
        debug!(session_id = %handle.session_id, user_id = handle.user_id, "session registered");
        state.sessions.insert(handle.session_id, handle);
    }

    /// Place a session in a group room. Idempotent: joining a room the
    /// session is already in changes nothing. Membership authorization is
    /// the caller's job; the registry only tracks presence.
    pub async fn join(&self, group_id: i64, session_id: SessionId) -> bool {
        let mut state = self.inner.lock().await;
        if !state.sessions.contains_key(&session_id) {
            return false;
        }
        state.rooms.entry(group_id).or_default().insert(session_id);
        true
    }

    /// Remove a session from a room. Returns false when the session was
    /// not present. Deletes the room once its last session leaves.
    pub async fn leave(&self, group_id: i64, session_id: SessionId) -> bool {
        let mut state = self.inner.lock().await;
        let Some(members) = state.rooms.get_mut(&group_id) else {
            return false;
        };
        let removed = members.remove(&session_id);
        if members.is_empty() {
            state.rooms.remove(&group_id);
        }
        removed
    }

    /// Unconditional cleanup on disconnect: drop the session from every
    /// room it occupies and from the session index.
    pub async fn remove_session(&self, session_id: SessionId) {
        let mut state = self.inner.lock().await;
        state.rooms.retain(|_, members| {
            members.remove(&session_id);
            !members.is_empty()
        });
        if state.sessions.remove(&session_id).is_some() {
            debug!(session_id = %session_id, "session removed");
        }
    }

    /// Handles of every session currently in the room, captured at the
    /// moment of the call. Joins and leaves after the call do not affect
    /// the returned set.
    pub async fn snapshot(&self, group_id: i64) -> Vec<SessionHandle> {
        let state = self.inner.lock().await;
        let Some(members) = state.rooms.get(&group_id) else {
            return Vec::new();
        };
        members
            .iter()
            .filter_map(|id| state.sessions.get(id).cloned())
            .collect()
    }

    /// Users with at least one live session anywhere, regardless of which
    /// rooms they joined. Used to decide who gets a durable notification
    /// instead of (not in addition to) a live event.
    pub async fn connected_user_ids(&self) -> HashSet<i64> {
        let state = self.inner.lock().await;
        state.sessions.values().map(|handle| handle.user_id).collect()
    }

    pub async fn is_user_connected(&self, user_id: i64) -> bool {
        let state = self.inner.lock().await;
        state.sessions.values().any(|handle| handle.user_id == user_id)
    }

    pub async fn room_count(&self) -> usize {
        self.inner.lock().await.rooms.len()
    }

    pub async fn session_count(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::OutboundQueue;

    fn handle(user_id: i64) -> SessionHandle {
        SessionHandle {
            session_id: SessionId::new(),
            user_id,
            queue: OutboundQueue::new(8),
        }
    }

    #[tokio::test]
    async fn join_is_idempotent() {
        let registry = RoomRegistry::new();
        let session = handle(1);
        let id = session.session_id;
        registry.register(session).await;

        assert!(registry.join(5, id).await);
        assert!(registry.join(5, id).await);
        assert_eq!(registry.snapshot(5).await.len(), 1);
    }

    #[tokio::test]
    async fn join_requires_registered_session() {
        let registry = RoomRegistry::new();
        assert!(!registry.join(5, SessionId::new()).await);
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn room_exists_iff_occupied() {
        let registry = RoomRegistry::new();
        let a = handle(1);
        let b = handle(2);
        let (a_id, b_id) = (a.session_id, b.session_id);
        registry.register(a).await;
        registry.register(b).await;

        registry.join(5, a_id).await;
        registry.join(5, b_id).await;
        assert_eq!(registry.room_count().await, 1);

        assert!(registry.leave(5, a_id).await);
        assert_eq!(registry.room_count().await, 1);

        assert!(registry.leave(5, b_id).await);
        assert_eq!(registry.room_count().await, 0);

        // leaving an empty (deleted) room is reported, not an error
        assert!(!registry.leave(5, b_id).await);
    }

    #[tokio::test]
    async fn remove_session_cleans_every_room() {
        let registry = RoomRegistry::new();
        let a = handle(1);
        let a_id = a.session_id;
        registry.register(a).await;
        registry.join(1, a_id).await;
        registry.join(2, a_id).await;
        registry.join(3, a_id).await;

        registry.remove_session(a_id).await;

        assert_eq!(registry.room_count().await, 0);
        assert_eq!(registry.session_count().await, 0);
        assert!(!registry.is_user_connected(1).await);
    }

    #[tokio::test]
    async fn connected_users_span_all_sessions() {
        let registry = RoomRegistry::new();
        let first = handle(1);
        let second = handle(1); // same user, second device
        let third = handle(2);
        let first_id = first.session_id;
        registry.register(first).await;
        registry.register(second).await;
        registry.register(third).await;

        assert!(registry.is_user_connected(1).await);
        registry.remove_session(first_id).await;
        // user 1 still has the second session
        assert!(registry.is_user_connected(1).await);
        assert_eq!(registry.connected_user_ids().await.len(), 2);
    }
}
