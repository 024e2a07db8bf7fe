//! Authentication and session ports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How far a client session has come through the two login steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    /// Username and password accepted, one-time code still outstanding.
    PasswordVerified,
    /// Both factors passed; protected routes are open.
    Authenticated,
}

impl SessionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStage::PasswordVerified => "password_verified",
            SessionStage::Authenticated => "authenticated",
        }
    }
}

/// Per-client session flag written by the login steps.
///
/// The core only ever writes to it; the web layer reads it to gate routes.
pub trait Session {
    fn set_stage(&mut self, stage: SessionStage);

    fn clear(&mut self);
}

/// Claims carried by an issued session token.
#[derive(Debug, Clone)]
pub struct SessionClaims {
    pub username: String,
    pub stage: SessionStage,
    pub exp: i64,
}

/// Token service trait for signed session tokens.
pub trait TokenService: Send + Sync {
    /// Issue a token recording `stage` for `username`.
    fn issue(&self, username: &str, stage: SessionStage) -> Result<String, AuthError>;

    /// Validate and decode a token.
    fn validate(&self, token: &str) -> Result<SessionClaims, AuthError>;

    /// Token lifetime in seconds.
    fn expiration_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Time-based one-time code check against the pre-shared secret.
pub trait CodeVerifier: Send + Sync {
    fn verify(&self, code: &str, at: DateTime<Utc>) -> bool;
}

/// Authentication plumbing errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing session")]
    MissingAuth,

    #[error("Second factor not completed")]
    SecondFactorPending,

    #[error("Hashing error: {0}")]
    HashingError(String),

    #[error("Invalid secret: {0}")]
    InvalidSecret(String),
}
