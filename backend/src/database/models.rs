//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. Note that these are the persisted shapes only: the
//! request-scoped principal built from token claims lives in `auth::models`
//! and is deliberately a different type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use validator::Validate;

/// Persisted user record. Never used directly as an authentication
/// principal; login and per-request paths each build their own view.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub enabled: bool,
    pub account_non_locked: bool,
    pub credentials_non_expired: bool,
    pub account_non_expired: bool,
    pub failed_login_attempts: i64,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert shape for a new user row. The password arrives here already hashed.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username must be between 3-50 characters"
    ))]
    pub username: String,

    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Password hash is required"))]
    pub password_hash: String,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Full name must be between 1-100 characters"
    ))]
    pub full_name: String,

    pub enabled: bool,
}

/// Role row as persisted. Role names are stored with the `ROLE_` authority
/// prefix; everywhere else in the application roles are the typed [`Role`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// The closed set of roles known to the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Hr,
    Manager,
    Employee,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Hr, Role::Manager, Role::Employee];

    /// Unprefixed name as it appears in token claims and API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Hr => "HR",
            Role::Manager => "MANAGER",
            Role::Employee => "EMPLOYEE",
        }
    }

    /// Prefixed authority name as stored in the roles table. This is the
    /// single point where the `ROLE_` convention exists.
    pub fn authority(&self) -> &'static str {
        match self {
            Role::Admin => "ROLE_ADMIN",
            Role::Hr => "ROLE_HR",
            Role::Manager => "ROLE_MANAGER",
            Role::Employee => "ROLE_EMPLOYEE",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin => "Full administrative access",
            Role::Hr => "Human resources operations",
            Role::Manager => "Team and approval management",
            Role::Employee => "Standard employee access",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts both the claim form (`ADMIN`) and the stored authority form
    /// (`ROLE_ADMIN`), case-insensitively.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let name = input.trim().to_uppercase();
        let name = name.strip_prefix("ROLE_").unwrap_or(&name);
        match name {
            "ADMIN" => Ok(Role::Admin),
            "HR" => Ok(Role::Hr),
            "MANAGER" => Ok(Role::Manager),
            "EMPLOYEE" => Ok(Role::Employee),
            _ => Err(format!("Unknown role: {}", input)),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
