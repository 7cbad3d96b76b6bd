//! HRMS backend library.
//!
//! Exposes the application modules and the router constructor so the binary
//! and the integration tests can build the same application.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod repositories;
pub mod services;
pub mod utils;

use crate::api::common::ApiResponse;
use crate::config::Config;
use crate::utils::jwt::JwtCodec;
use axum::{Extension, Router, response::Json, routing::get};
use sqlx::SqlitePool;

/// Builds the full application router with all routes and shared state.
pub fn app(pool: SqlitePool, codec: JwtCodec, config: Config) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .nest("/api/auth", auth::routes::auth_router())
        .nest("/api/users", api::user::routes::user_router())
        .layer(Extension(pool))
        .layer(Extension(codec))
        .layer(Extension(config))
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "HRMS Backend",
            "version": env!("CARGO_PKG_VERSION")
        }),
        "Welcome to the HRMS API",
    ))
}
