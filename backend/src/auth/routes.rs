//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle endpoints like user login, registration, token
//! refreshing and session inspection. They are designed to be nested under
//! `/api/auth` in the main Axum router.

use crate::auth::handlers::*;
use crate::auth::middleware::require_auth;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/validate", get(validate_token))
        .route("/check-username", get(check_username))
        .route("/check-email", get(check_email))
        .route("/me", get(me).layer(middleware::from_fn(require_auth)))
}
