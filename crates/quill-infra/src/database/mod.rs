//! Repositories: PostgreSQL via SeaORM, plus in-memory fallbacks.

mod memory;

#[cfg(feature = "postgres")]
mod connections;
#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

pub use memory::{InMemoryLoginAttemptRepository, InMemoryPostRepository};

#[cfg(feature = "postgres")]
pub use connections::{DatabaseConfig, DatabaseConnections};

#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresLoginAttemptRepository, PostgresPostRepository};
