//! Durable notification query surface. Every handler resolves the caller
//! from the bearer credential; all reads and mutations are scoped to that
//! recipient.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use hearth_database::repos::notifications;
use hearth_database::Notification;

use crate::{ApiError, AppState};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<NotificationPage>, ApiError> {
    let identity = state.authorize(&headers)?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let (notifications, total) =
        notifications::list_page(state.pool(), identity.user_id, page, limit).await?;
    let pages = (total + limit - 1) / limit;

    Ok(Json(NotificationPage {
        notifications,
        total,
        pages,
        current_page: page,
    }))
}

pub async fn unread_count(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let identity = state.authorize(&headers)?;
    let count = notifications::unread_count(state.pool(), identity.user_id).await?;
    Ok(Json(serde_json::json!({ "unread_count": count })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let identity = state.authorize(&headers)?;
    notifications::mark_read(state.pool(), notification_id, identity.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let identity = state.authorize(&headers)?;
    let updated = notifications::mark_all_read(state.pool(), identity.user_id).await?;
    Ok(Json(serde_json::json!({ "updated_count": updated })))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    Path(notification_id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let identity = state.authorize(&headers)?;
    notifications::delete(state.pool(), notification_id, identity.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
