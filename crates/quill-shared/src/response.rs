//! Standardized API response types (RFC 7807 compliant for errors).

use serde::{Deserialize, Serialize};

/// Standard successful API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

/// RFC 7807 Problem Details for HTTP APIs.
///
/// See: https://datatracker.ietf.org/doc/html/rfc7807
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub error_type: String,

    /// A short, human-readable summary of the problem type.
    pub title: String,

    /// The HTTP status code.
    pub status: u16,

    /// A human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Password tries left before the account locks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u32>,

    /// Whole minutes until a locked account accepts logins again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_minutes: Option<i64>,
}

impl ErrorResponse {
    pub fn new(status: u16, title: impl Into<String>) -> Self {
        Self {
            error_type: "about:blank".to_string(),
            title: title.into(),
            status,
            detail: None,
            attempts_remaining: None,
            retry_after_minutes: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    // Common error constructors
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(400, "Bad Request").with_detail(detail)
    }

    pub fn unauthorized() -> Self {
        Self::new(401, "Unauthorized")
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(404, "Not Found").with_detail(detail)
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(409, "Conflict").with_detail(detail)
    }

    pub fn invalid_credentials(attempts_remaining: u32) -> Self {
        let mut body = Self::new(401, "Unauthorized").with_detail(format!(
            "Invalid username or password. {attempts_remaining} attempts remaining."
        ));
        body.attempts_remaining = Some(attempts_remaining);
        body
    }

    pub fn locked_out(retry_after_minutes: i64) -> Self {
        let mut body = Self::new(429, "Too Many Requests").with_detail(format!(
            "Too many failed login attempts. Try again in {retry_after_minutes} minutes."
        ));
        body.retry_after_minutes = Some(retry_after_minutes);
        body
    }

    pub fn internal_error() -> Self {
        Self::new(500, "Internal Server Error")
    }
}
