use axum::{extract::State, http::{HeaderMap, StatusCode}, Json};
use serde::Deserialize;

use hearth_database::repos::users;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct PushTokenRequest {
    /// `null` unregisters the device.
    pub push_token: Option<String>,
}

/// Register (or clear) the caller's push-delivery address.
pub async fn set_push_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PushTokenRequest>,
) -> Result<StatusCode, ApiError> {
    let identity = state.authorize(&headers)?;
    users::set_push_token(state.pool(), identity.user_id, request.push_token.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}
