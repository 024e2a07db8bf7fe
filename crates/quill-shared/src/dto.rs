//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Body for creating or editing a post.
///
/// `tags` is the raw comma-separated field as typed by the author.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WritePostRequest {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub tags: String,
}

/// A post as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub mood: String,
    pub tags: Vec<String>,
    pub date_created: String,
    pub date_edited: String,
}

/// Every distinct tag across all posts, sorted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

/// First login step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Second login step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotpRequest {
    pub code: String,
}

/// Where the caller's session stands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub logged_in: bool,
    /// `password_verified` or `authenticated`; absent when there is no session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Seconds until the session token expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl SessionResponse {
    pub fn anonymous() -> Self {
        Self {
            logged_in: false,
            stage: None,
            username: None,
            expires_in: None,
        }
    }
}
