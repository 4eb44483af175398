use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use hearth_auth::AuthError;
use hearth_database::StoreError;

/// Failures from the service layer, before they are shaped for HTTP or
/// the socket.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not a member of this group")]
    Membership,
    #[error("{0}")]
    Validation(String),
    #[error("access denied")]
    Forbidden,
    #[error("resource not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::NotRecipient => Self::Forbidden,
            StoreError::Validation(msg) => Self::Validation(msg),
            StoreError::Query(err) => Self::Database(err),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Membership => ApiError::forbidden("not a member of this group"),
            ServiceError::Validation(msg) => ApiError::bad_request(msg),
            ServiceError::Forbidden => ApiError::forbidden("access denied"),
            ServiceError::NotFound => ApiError::not_found("resource not found"),
            ServiceError::Database(err) => {
                error!(error = %err, "database error");
                ApiError::internal_server_error("database operation failed")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::from(ServiceError::from(err))
    }
}

// Every credential failure is the same refusal to the caller; the
// distinction only matters for logs.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        tracing::debug!(error = %err, "credential refused");
        ApiError::unauthorized("invalid credential")
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!(error = ?err, "internal error");
        ApiError::internal_server_error("internal error")
    }
}
