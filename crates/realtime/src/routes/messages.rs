use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use hearth_database::Message;

use crate::services::chat;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub before: Option<i64>,
}

/// Recent group history, newest first. Clients call this after a
/// `resync_required` event or on reconnect.
pub async fn recent_messages(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let identity = state.authorize(&headers)?;
    let messages = chat::recent_messages(
        state.pool(),
        group_id,
        identity.user_id,
        query.limit,
        query.before,
    )
    .await?;
    Ok(Json(messages))
}
