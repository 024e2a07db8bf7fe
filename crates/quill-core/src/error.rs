//! Domain-level error types.

use thiserror::Error;

/// Why a password attempt was turned away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Denial {
    /// Wrong credentials, the account is still below the attempt cap.
    InvalidCredentials { attempts_remaining: u32 },
    /// The attempt cap is reached and the lockout window is still running.
    LockedOut { retry_in_minutes: f64 },
}

impl Denial {
    /// Remaining lockout rounded to whole minutes, for display.
    pub fn retry_in_whole_minutes(&self) -> Option<i64> {
        match self {
            Denial::LockedOut { retry_in_minutes } => Some(retry_in_minutes.round() as i64),
            Denial::InvalidCredentials { .. } => None,
        }
    }
}

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Authentication denied: {0:?}")]
    AuthDenied(Denial),

    #[error("Invalid one-time code")]
    CodeInvalid,

    #[error("Storage failure: {0}")]
    Infrastructure(#[from] RepoError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn post_not_found(id: i64) -> Self {
        DomainError::NotFound {
            entity_type: "post",
            id: id.to_string(),
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Storage call exceeded {0:?}")]
    Timeout(std::time::Duration),
}
