//! Authentication implementations.

mod jwt;
mod password;
mod totp;

pub use jwt::{JwtConfig, JwtTokenService};
pub use password::Argon2PasswordService;
pub use totp::TotpCodeVerifier;
