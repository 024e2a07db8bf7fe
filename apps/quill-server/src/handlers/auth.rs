//! Login, one-time code, logout and session handlers.

use actix_web::{HttpResponse, web};

use quill_core::ports::{Session, SessionStage};
use quill_shared::dto::{LoginRequest, SessionResponse, TotpRequest};

use crate::middleware::auth::{SessionGrant, SessionIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let mut grant = SessionGrant::default();
    state
        .throttle
        .authenticate(&req.username, &req.password, &mut grant)
        .await?;

    grant.respond(&state, &req.username)
}

/// POST /api/auth/totp - needs a password-verified session
pub async fn totp(
    state: web::Data<AppState>,
    session: SessionIdentity,
    body: web::Json<TotpRequest>,
) -> AppResult<HttpResponse> {
    let mut grant = SessionGrant::default();
    state.second_factor.verify(&body.code, &mut grant)?;

    grant.respond(&state, &session.username)
}

/// POST /api/auth/logout
pub async fn logout(
    state: web::Data<AppState>,
    session: Option<SessionIdentity>,
) -> AppResult<HttpResponse> {
    let mut grant = SessionGrant::default();
    if let Some(session) = session {
        grant.set_stage(session.stage);
        tracing::info!(username = %session.username, "Session ended");
    }
    grant.clear();

    grant.respond(&state, "")
}

/// GET /api/auth/session
pub async fn session(
    state: web::Data<AppState>,
    session: Option<SessionIdentity>,
) -> HttpResponse {
    let body = match session {
        Some(session) => SessionResponse {
            logged_in: session.stage == SessionStage::Authenticated,
            stage: Some(session.stage.as_str().to_string()),
            username: Some(session.username),
            expires_in: Some(state.tokens.expiration_seconds()),
        },
        None => SessionResponse::anonymous(),
    };

    HttpResponse::Ok().json(body)
}
