//! Room fan-out.

use tracing::debug;

use crate::events::ServerEvent;
use crate::rooms::RoomRegistry;
use crate::session::SessionId;

/// Enqueue an event to every session in the room except `exclude`
/// (normally the sender's own session). Operates on a snapshot taken at
/// invocation: sessions joining afterwards miss the event, sessions that
/// left are skipped. Returns how many queues accepted the event.
pub async fn broadcast(
    registry: &RoomRegistry,
    group_id: i64,
    event: &ServerEvent,
    exclude: Option<SessionId>,
) -> usize {
    let targets = registry.snapshot(group_id).await;
    let mut delivered = 0;

    for handle in targets {
        if Some(handle.session_id) == exclude {
            continue;
        }
        if handle.queue.push(event.clone()).await {
            delivered += 1;
        }
    }

    debug!(group_id, delivered, "broadcast fanned out");
    delivered
}
