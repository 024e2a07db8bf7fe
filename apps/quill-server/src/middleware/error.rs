//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::http::header::RETRY_AFTER;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use quill_core::ports::AuthError;
use quill_core::{Denial, DomainError, RepoError};
use quill_shared::ErrorResponse;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid credentials, {attempts_remaining} attempts remaining")]
    InvalidCredentials { attempts_remaining: u32 },

    #[error("Locked out for {retry_in_minutes:.1} more minutes")]
    LockedOut { retry_in_minutes: f64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::InvalidCredentials { .. } => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::LockedOut { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());

        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized(detail) => ErrorResponse::unauthorized().with_detail(detail),
            AppError::Conflict(detail) => ErrorResponse::conflict(detail),
            AppError::InvalidCredentials { attempts_remaining } => {
                ErrorResponse::invalid_credentials(*attempts_remaining)
            }
            AppError::LockedOut { retry_in_minutes } => {
                let seconds = (retry_in_minutes * 60.0).ceil().max(1.0) as u64;
                builder.insert_header((RETRY_AFTER, seconds.to_string()));
                ErrorResponse::locked_out(retry_in_minutes.round() as i64)
            }
            AppError::Internal(detail) => {
                // Log internal errors
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        builder.json(error)
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} with id {} not found", entity_type, id))
            }
            DomainError::Validation(msg) => AppError::BadRequest(msg),
            DomainError::Duplicate(msg) => AppError::Conflict(msg),
            DomainError::AuthDenied(Denial::InvalidCredentials { attempts_remaining }) => {
                AppError::InvalidCredentials { attempts_remaining }
            }
            DomainError::AuthDenied(Denial::LockedOut { retry_in_minutes }) => {
                AppError::LockedOut { retry_in_minutes }
            }
            DomainError::CodeInvalid => {
                AppError::Unauthorized("Invalid one-time code.".to_string())
            }
            DomainError::Infrastructure(e) => e.into(),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Timeout(limit) => {
                tracing::error!(?limit, "Storage call timed out");
                AppError::Internal("Database timeout".to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
