//! # Quill API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::io;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        io::Error::other(e)
    })?;

    tracing::info!(
        "Starting Quill API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await.map_err(|e| {
        tracing::error!("Startup failed: {}", e);
        io::Error::other(e)
    })?;

    HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
