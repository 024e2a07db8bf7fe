//! One-time code step of the login.

use std::sync::Arc;

use crate::error::DomainError;
use crate::ports::{Clock, CodeVerifier, Session, SessionStage};

/// Validates the time-based code. Independent of the login throttle.
pub struct SecondFactor {
    verifier: Arc<dyn CodeVerifier>,
    clock: Arc<dyn Clock>,
}

impl SecondFactor {
    pub fn new(verifier: Arc<dyn CodeVerifier>, clock: Arc<dyn Clock>) -> Self {
        Self { verifier, clock }
    }

    pub fn verify<S>(&self, code: &str, session: &mut S) -> Result<SessionStage, DomainError>
    where
        S: Session + ?Sized,
    {
        let code = code.trim();
        if code.is_empty() || !self.verifier.verify(code, self.clock.now()) {
            tracing::warn!("One-time code rejected");
            return Err(DomainError::CodeInvalid);
        }

        session.set_stage(SessionStage::Authenticated);
        tracing::info!("Second factor accepted");
        Ok(SessionStage::Authenticated)
    }
}
