//! TOTP second factor (RFC 6238: SHA-1, 6 digits, 30 second step).

use chrono::{DateTime, Utc};
use totp_rs::{Algorithm, Secret, TOTP};

use quill_core::ports::{AuthError, CodeVerifier};

const DIGITS: usize = 6;
const STEP_SECS: u64 = 30;
/// Codes from one step either side of now are accepted.
const SKEW: u8 = 1;

/// Verifies authenticator-app codes against the shared base32 secret.
pub struct TotpCodeVerifier {
    totp: TOTP,
}

impl TotpCodeVerifier {
    /// Build from a base32 secret as shown by authenticator apps.
    /// Spaces, padding and lower case are tolerated.
    pub fn from_base32(secret: &str) -> Result<Self, AuthError> {
        let normalized: String = secret
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '=')
            .collect::<String>()
            .to_uppercase();
        if normalized.is_empty() {
            return Err(AuthError::InvalidSecret("empty secret".to_string()));
        }

        let bytes = Secret::Encoded(normalized)
            .to_bytes()
            .map_err(|e| AuthError::InvalidSecret(format!("{e:?}")))?;

        Ok(Self {
            totp: TOTP::new_unchecked(Algorithm::SHA1, DIGITS, SKEW, STEP_SECS, bytes),
        })
    }

    /// The code an authenticator shows at `at`.
    pub fn code_at(&self, at: DateTime<Utc>) -> String {
        self.totp.generate(unix_seconds(at))
    }
}

impl CodeVerifier for TotpCodeVerifier {
    fn verify(&self, code: &str, at: DateTime<Utc>) -> bool {
        code.len() == DIGITS && self.totp.check(code, unix_seconds(at))
    }
}

fn unix_seconds(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp()).unwrap_or(0)
}
