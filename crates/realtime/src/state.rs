use std::sync::Arc;

use axum::http::HeaderMap;
use sqlx::SqlitePool;

use hearth_auth::{CredentialVerifier, Identity};
use hearth_config::RealtimeConfig;

use crate::dispatcher::NotificationDispatcher;
use crate::rooms::RoomRegistry;
use crate::util::require_bearer;
use crate::ApiError;

#[derive(Clone)]
pub struct AppState {
    pool: SqlitePool,
    verifier: CredentialVerifier,
    registry: Arc<RoomRegistry>,
    dispatcher: NotificationDispatcher,
    realtime: RealtimeConfig,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        verifier: CredentialVerifier,
        dispatcher: NotificationDispatcher,
        realtime: RealtimeConfig,
    ) -> Self {
        Self {
            pool,
            verifier,
            registry: Arc::new(RoomRegistry::new()),
            dispatcher,
            realtime,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    pub fn realtime(&self) -> &RealtimeConfig {
        &self.realtime
    }

    /// Resolve the identity behind a bearer-authed HTTP request.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<Identity, ApiError> {
        let token = require_bearer(headers)?;
        Ok(self.verifier.verify(&token)?)
    }
}
