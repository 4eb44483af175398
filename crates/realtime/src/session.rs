//! Live session identity and the per-session outbound queue.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use tracing::warn;
use uuid::Uuid;

use crate::events::ServerEvent;

/// Opaque identifier for one connection. A user connected twice has two
/// distinct sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// What the registry hands to broadcasters: enough to address a session
/// without touching the transport.
#[derive(Clone)]
pub struct SessionHandle {
    pub session_id: SessionId,
    pub user_id: i64,
    pub queue: Arc<OutboundQueue>,
}

struct QueueState {
    events: VecDeque<ServerEvent>,
    closed: bool,
    overflowed: bool,
}

/// Bounded outbound event queue between broadcasters and the session's
/// writer task.
///
/// A slow consumer never blocks a broadcaster: when the queue is full the
/// oldest droppable event is discarded and, on the first overflow, a
/// `resync_required` event is enqueued so the client knows to refetch.
pub struct OutboundQueue {
    inner: Mutex<QueueState>,
    notify: Notify,
    capacity: usize,
}

impl OutboundQueue {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(QueueState {
                events: VecDeque::with_capacity(capacity.min(64)),
                closed: false,
                overflowed: false,
            }),
            notify: Notify::new(),
            capacity: capacity.max(1),
        })
    }

    /// Enqueue an event, discarding the oldest droppable one on overflow.
    /// Returns false if the session is already closed.
    pub async fn push(&self, event: ServerEvent) -> bool {
        let mut state = self.inner.lock().await;
        if state.closed {
            return false;
        }

        if state.events.len() >= self.capacity {
            if let Some(pos) = state.events.iter().position(ServerEvent::droppable) {
                state.events.remove(pos);
            }
            if !state.overflowed {
                state.overflowed = true;
                warn!(capacity = self.capacity, "session queue overflow, client must resync");
                state.events.push_back(ServerEvent::ResyncRequired);
            }
        }

        state.events.push_back(event);
        drop(state);
        self.notify.notify_one();
        true
    }

    /// Wait for the next event. Returns `None` once the queue is closed
    /// and drained.
    pub async fn recv(&self) -> Option<ServerEvent> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.inner.lock().await;
                if let Some(event) = state.events.pop_front() {
                    return Some(event);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    pub async fn close(&self) {
        let mut state = self.inner.lock().await;
        state.closed = true;
        drop(state);
        self.notify.notify_waiters();
    }

    pub async fn overflowed(&self) -> bool {
        self.inner.lock().await.overflowed
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.events.len()
    }
}
