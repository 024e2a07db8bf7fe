//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod clock;
mod repository;

pub use auth::{
    AuthError, CodeVerifier, PasswordService, Session, SessionClaims, SessionStage, TokenService,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use repository::{BaseRepository, LoginAttemptRepository, PostRepository};
