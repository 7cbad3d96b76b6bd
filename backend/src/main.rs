//! Main entry point for the HRMS backend.
//!
//! Initializes tracing, loads configuration, connects to the database and
//! starts the Axum server with all routes registered.

use anyhow::Context;
use backend::config::Config;
use backend::database::{Database, seed_defaults};
use backend::utils::jwt::JwtCodec;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env().context("failed to load configuration")?;
    let db = Database::new(&config)
        .await
        .context("failed to connect to database")?;
    db.migrate().await.context("failed to run migrations")?;
    seed_defaults(db.pool())
        .await
        .context("failed to seed default roles and admin user")?;

    let codec = JwtCodec::from_config(&config);
    let app = backend::app(db.pool().clone(), codec, config.clone());

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    info!("Starting HRMS server on port {}", config.server_port);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
