//! Hearth realtime core: authenticated sessions, group rooms, live
//! broadcast and durable notification fan-out.

mod error;
mod state;
mod util;

pub mod broadcast;
pub mod dispatcher;
pub mod events;
pub mod push;
pub mod rooms;
pub mod routes;
pub mod services;
pub mod session;

pub use error::{ApiError, ServiceError};
pub use state::AppState;

use axum::{
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/ws", get(routes::websocket::websocket_handler))
        // Notification surface
        .route(
            "/api/notifications",
            get(routes::notifications::list_notifications),
        )
        .route(
            "/api/notifications/unread-count",
            get(routes::notifications::unread_count),
        )
        .route(
            "/api/notifications/:notification_id/read",
            post(routes::notifications::mark_read),
        )
        .route(
            "/api/notifications/read-all",
            post(routes::notifications::mark_all_read),
        )
        .route(
            "/api/notifications/:notification_id",
            delete(routes::notifications::delete_notification),
        )
        // User surface
        .route("/api/users/push-token", put(routes::users::set_push_token))
        // History for reconnect resynchronization
        .route(
            "/api/groups/:group_id/messages",
            get(routes::messages::recent_messages),
        )
        .with_state(state)
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
