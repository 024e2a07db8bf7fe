//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`.
//! This crate contains the database repositories and the authentication
//! adapters (Argon2, JWT session tokens, TOTP).
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No database driver, in-memory repositories only
//! - `postgres` - PostgreSQL repositories via SeaORM

pub mod auth;
pub mod database;

// Re-exports - In-Memory
pub use database::{InMemoryLoginAttemptRepository, InMemoryPostRepository};

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService, TotpCodeVerifier};

#[cfg(feature = "postgres")]
pub use database::{
    DatabaseConfig, DatabaseConnections, PostgresLoginAttemptRepository, PostgresPostRepository,
};
