//! Data structures for authentication-related entities.
//!
//! Defines the request/response models for login, registration and token
//! management, plus the request-scoped identity context built from verified
//! token claims. The identity context is a distinct type from the persisted
//! user record: it is constructed fresh per request and never stored.

use crate::database::models::Role;
use crate::utils::jwt::Claims;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

/// Login request payload. The identifier may be a username or an email.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username or email is required"))]
    pub username_or_email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl LoginRequest {
    /// Normalized login identifier: trimmed and lowercased.
    pub fn normalized_identifier(&self) -> String {
        self.username_or_email.trim().to_lowercase()
    }
}

/// Registration request payload
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username must be between 3-50 characters"
    ))]
    pub username: String,

    #[validate(email(message = "Must be a valid email"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,

    #[validate(length(min = 1, message = "Password confirmation is required"))]
    pub confirm_password: String,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Full name must be between 1-100 characters"
    ))]
    pub full_name: String,

    /// Optional role names; defaults to EMPLOYEE when absent
    pub roles: Option<Vec<String>>,
}

/// Login response body. The tokens themselves travel only in cookies.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<Role>,
    pub enabled: bool,
    pub account_non_locked: bool,
    /// Access-token expiry as epoch milliseconds
    pub expires_at: i64,
    /// Refresh-token expiry as epoch milliseconds
    pub refresh_expires_at: i64,
}

/// Registration response body
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub roles: Vec<Role>,
}

/// Refresh response body; the new access token is set as a cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New access-token expiry as epoch milliseconds
    pub expires_at: i64,
}

/// Response for the token validation endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenValidationResponse {
    pub username: String,
    pub remaining_time_ms: i64,
}

/// Response for the availability check endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub value: String,
    pub available: bool,
}

/// Request-scoped identity context reconstructed from a verified access
/// token. Built purely from claims: resolving it performs no storage access.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<Role>,
}

impl AuthenticatedUser {
    /// Builds the identity context from verified access-token claims.
    ///
    /// Returns `None` for claims that do not describe a full identity, such
    /// as refresh tokens (no user id, no roles) presented in the access
    /// cookie.
    pub fn from_claims(claims: &Claims) -> Option<Self> {
        if claims.is_refresh() {
            return None;
        }

        let roles = claims
            .roles
            .iter()
            .filter_map(|name| Role::from_str(name).ok())
            .collect::<Vec<_>>();

        Some(AuthenticatedUser {
            id: claims.user_id?,
            username: claims.sub.clone(),
            email: claims.email.clone()?,
            full_name: claims.full_name.clone()?,
            roles,
        })
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}
