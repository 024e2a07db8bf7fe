//! Application state - shared across all handlers.

use std::sync::Arc;

use thiserror::Error;

use quill_core::DomainError;
use quill_core::ports::{
    AuthError, Clock, LoginAttemptRepository, PostRepository, SystemClock, TokenService,
};
use quill_core::services::{AdminCredentials, LoginThrottle, PostCache, SecondFactor};
use quill_infra::{
    Argon2PasswordService, InMemoryLoginAttemptRepository, InMemoryPostRepository, JwtConfig,
    JwtTokenService, TotpCodeVerifier,
};

#[cfg(feature = "postgres")]
use quill_infra::{DatabaseConfig, DatabaseConnections};

use crate::config::AppConfig;

/// Failures while assembling the state at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("auth setup failed: {0}")]
    Auth(#[from] AuthError),

    #[error("could not load posts: {0}")]
    Posts(#[from] DomainError),

    #[error("database unavailable: {0}")]
    Database(String),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostCache>,
    pub throttle: Arc<LoginThrottle>,
    pub second_factor: Arc<SecondFactor>,
    pub tokens: Arc<dyn TokenService>,
    pub clock: Arc<dyn Clock>,
    pub cookie_secure: bool,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        let (posts, attempts) = repositories(config).await?;
        Self::assemble(config, posts, attempts, Arc::new(SystemClock)).await
    }

    /// Wire the services over the given repositories and clock.
    pub async fn assemble(
        config: &AppConfig,
        post_repo: Arc<dyn PostRepository>,
        attempt_repo: Arc<dyn LoginAttemptRepository>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StartupError> {
        let passwords = Arc::new(Argon2PasswordService::new());
        let credentials = AdminCredentials {
            username: config.admin_username.clone(),
            password_hash: passwords.credential_hash(&config.admin_password)?,
        };
        let verifier = Arc::new(TotpCodeVerifier::from_base32(&config.totp_secret)?);

        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(JwtConfig {
            secret: config.session.secret.clone(),
            expiration_hours: config.session.ttl_hours,
            issuer: config.session.issuer.clone(),
        }));

        let posts = PostCache::load(post_repo, config.storage_timeout).await?;
        let throttle = LoginThrottle::new(attempt_repo, passwords, clock.clone(), credentials)
            .with_storage_timeout(config.storage_timeout);
        let second_factor = SecondFactor::new(verifier, clock.clone());

        tracing::info!("Application state initialized");

        Ok(Self {
            posts: Arc::new(posts),
            throttle: Arc::new(throttle),
            second_factor: Arc::new(second_factor),
            tokens,
            clock,
            cookie_secure: config.session.cookie_secure,
        })
    }
}

type Repositories = (Arc<dyn PostRepository>, Arc<dyn LoginAttemptRepository>);

fn in_memory() -> Repositories {
    (
        Arc::new(InMemoryPostRepository::new()),
        Arc::new(InMemoryLoginAttemptRepository::new()),
    )
}

#[cfg(feature = "postgres")]
async fn repositories(config: &AppConfig) -> Result<Repositories, StartupError> {
    let Some(settings) = config.database.as_ref() else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return Ok(in_memory());
    };

    let db_config = DatabaseConfig {
        url: settings.url.clone(),
        max_connections: settings.max_connections,
        min_connections: settings.min_connections,
        connect_timeout: config.storage_timeout,
    };

    // A configured database that cannot be reached is fatal.
    let connections = DatabaseConnections::init(&db_config)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;

    Ok((
        Arc::new(connections.post_repository()),
        Arc::new(connections.login_attempt_repository()),
    ))
}

#[cfg(not(feature = "postgres"))]
async fn repositories(config: &AppConfig) -> Result<Repositories, StartupError> {
    if config.database.is_some() {
        tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
    }
    tracing::info!("Running without postgres feature - using in-memory repositories");
    Ok(in_memory())
}
