use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DbConn, DbErr};

use super::postgres_repo::{PostgresLoginAttemptRepository, PostgresPostRepository};

/// Configuration for the blog database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long to wait for the first connection before giving up.
    pub connect_timeout: Duration,
}

/// Connection pool shared by the post and login attempt repositories.
pub struct DatabaseConnections {
    pub main: DbConn,
}

impl DatabaseConnections {
    /// Open the pool described by `config`.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DbErr> {
        tracing::info!("Initializing database connection...");

        let opts = ConnectOptions::new(&config.url)
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(config.connect_timeout)
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(false)
            .to_owned();

        let main = Database::connect(opts).await?;
        tracing::info!(pool = config.max_connections, "Database connected");

        Ok(Self { main })
    }

    pub fn post_repository(&self) -> PostgresPostRepository {
        PostgresPostRepository::new(self.main.clone())
    }

    pub fn login_attempt_repository(&self) -> PostgresLoginAttemptRepository {
        PostgresLoginAttemptRepository::new(self.main.clone())
    }
}
