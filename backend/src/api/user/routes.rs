//! Defines the HTTP routes for administrative user management.
//!
//! Every route here requires an authenticated administrator.

use super::handlers::{list_roles, set_user_status, unlock_user};
use crate::auth::middleware::{require_admin, require_auth};
use axum::{
    Router, middleware,
    routing::{get, post},
};

pub fn user_router() -> Router {
    Router::new()
        .route("/roles", get(list_roles))
        .route("/{id}/unlock", post(unlock_user))
        .route("/{id}/status", post(set_user_status))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn(require_auth))
}
