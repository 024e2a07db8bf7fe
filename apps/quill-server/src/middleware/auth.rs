//! Session extractors and cookie plumbing.
//!
//! The session is a signed token carried in the `quill_session` cookie. A
//! `Bearer` Authorization header is accepted too, for API clients.

use std::future::{Ready, ready};

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, http::header, web};

use quill_core::ports::{AuthError, Session, SessionClaims, SessionStage};
use quill_shared::ErrorResponse;
use quill_shared::dto::SessionResponse;

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "quill_session";

/// A caller holding a valid session token at any stage.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub username: String,
    pub stage: SessionStage,
}

impl From<SessionClaims> for SessionIdentity {
    fn from(claims: SessionClaims) -> Self {
        Self {
            username: claims.username,
            stage: claims.stage,
        }
    }
}

/// A caller who has passed both login steps.
///
/// Use this in handlers to require the owner:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub username: String,
}

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AuthError::TokenExpired
            | AuthError::InvalidToken(_)
            | AuthError::MissingAuth
            | AuthError::SecondFactorPending => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Session Expired")
                .with_detail("Your session has expired. Please login again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::new(401, "Invalid Session").with_detail(msg.clone())
            }
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Please login first."),
            AuthError::SecondFactorPending => ErrorResponse::new(401, "Second Factor Required")
                .with_detail("Enter the one-time code to finish logging in."),
            _ => ErrorResponse::internal_error(),
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

fn session_token(req: &HttpRequest) -> Result<String, AuthError> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Ok(cookie.value().to_string());
    }

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    auth_str
        .strip_prefix("Bearer ")
        .map(String::from)
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

fn identify(req: &HttpRequest) -> Result<SessionIdentity, AuthError> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AuthError::InvalidToken(
            "Server configuration error".to_string(),
        ));
    };

    let token = session_token(req)?;
    state.tokens.validate(&token).map(SessionIdentity::from)
}

impl FromRequest for SessionIdentity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identify(req).map_err(AuthenticationError))
    }
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = identify(req).and_then(|session| match session.stage {
            SessionStage::Authenticated => Ok(Identity {
                username: session.username,
            }),
            SessionStage::PasswordVerified => Err(AuthError::SecondFactorPending),
        });
        ready(result.map_err(AuthenticationError))
    }
}

/// Collects the stage a login step grants, then turns it into a cookie.
#[derive(Debug, Default)]
pub struct SessionGrant {
    stage: Option<SessionStage>,
}

impl Session for SessionGrant {
    fn set_stage(&mut self, stage: SessionStage) {
        self.stage = Some(stage);
    }

    fn clear(&mut self) {
        self.stage = None;
    }
}

impl SessionGrant {
    /// Build the response for `username`, issuing a fresh session cookie if a
    /// stage was granted and removing the cookie otherwise.
    pub fn respond(self, state: &AppState, username: &str) -> AppResult<HttpResponse> {
        let Some(stage) = self.stage else {
            return Ok(HttpResponse::Ok()
                .cookie(removal_cookie())
                .json(SessionResponse::anonymous()));
        };

        let token = state.tokens.issue(username, stage)?;
        let ttl = state.tokens.expiration_seconds();
        let cookie = Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(state.cookie_secure)
            .max_age(CookieDuration::seconds(ttl))
            .finish();

        Ok(HttpResponse::Ok().cookie(cookie).json(SessionResponse {
            logged_in: stage == SessionStage::Authenticated,
            stage: Some(stage.as_str().to_string()),
            username: Some(username.to_string()),
            expires_in: Some(ttl),
        }))
    }
}

/// A cookie that tells the browser to drop the session.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}
