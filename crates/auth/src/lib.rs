//! Credential verification for realtime sessions.
//!
//! The account subsystem mints signed bearer credentials; this crate only
//! checks them. Verification happens before any session state exists, so
//! every failure here collapses to a connection refusal.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use hearth_config::AuthConfig;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("credential is expired")]
    Expired,
    #[error("credential is malformed or has an invalid signature")]
    Invalid,
    #[error("credential subject is not a user id")]
    BadSubject,
    #[error("failed to mint credential: {0}")]
    Mint(#[from] jsonwebtoken::errors::Error),
}

/// The authenticated principal behind a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

#[derive(Clone)]
pub struct CredentialVerifier {
    decoding_key: DecodingKey,
}

impl CredentialVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret)
    }

    /// Check signature and expiry and resolve the identity. Expired and
    /// malformed credentials are reported separately for logging, but
    /// callers refuse the connection the same way in every case.
    pub fn verify(&self, credential: &str) -> Result<Identity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let data = decode::<Claims>(credential, &self.decoding_key, &validation).map_err(
            |err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => {
                    debug!(error = %err, "credential rejected");
                    AuthError::Invalid
                }
            },
        )?;

        let user_id: i64 = data
            .claims
            .sub
            .parse()
            .map_err(|_| AuthError::BadSubject)?;

        Ok(Identity { user_id })
    }
}

/// Mint a credential the way the account subsystem does. Production code
/// never calls this; tests and seeding do.
pub fn issue_token(secret: &str, user_id: i64, ttl: Duration) -> Result<String, AuthError> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + ttl).timestamp(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}
