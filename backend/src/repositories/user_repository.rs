//! Database repository for user management operations.
//!
//! Provides persistence operations for user records, including the
//! failed-login bookkeeping the lockout mechanism relies on. All queries are
//! runtime-checked so the crate builds without a live database.

use crate::database::models::{CreateUser, Role, User};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::warn;

const USER_COLUMNS: &str = "id, username, email, password_hash, full_name, enabled, \
     account_non_locked, credentials_non_expired, account_non_expired, \
     failed_login_attempts, last_login, created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Creates a new UserRepository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database.
    pub async fn create_user(&self, user: CreateUser) -> Result<User> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, full_name, enabled, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.enabled)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// Retrieves a user by their unique identifier.
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Retrieves a user by their username.
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Retrieves a user by their email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Checks if a username already exists in the system.
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Checks if an email already exists in the system.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Increments the failed-login counter and locks the account once the
    /// threshold is reached.
    ///
    /// The increment and the lock decision happen in a single statement so
    /// concurrent failed attempts cannot lose updates.
    pub async fn record_failed_attempt(&self, username: &str, lock_threshold: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET failed_login_attempts = failed_login_attempts + 1,
                account_non_locked = CASE
                    WHEN failed_login_attempts + 1 >= ? THEN 0
                    ELSE account_non_locked
                END,
                updated_at = ?
            WHERE username = ?
            "#,
        )
        .bind(lock_threshold)
        .bind(Utc::now())
        .bind(username)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Resets the failed-login counter and stamps the last-login time.
    pub async fn record_successful_login(&self, username: &str) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE users SET failed_login_attempts = 0, last_login = ?, updated_at = ? \
             WHERE username = ?",
        )
        .bind(now)
        .bind(now)
        .bind(username)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Unlocks an account and resets its failed-login counter.
    ///
    /// # Returns
    /// `true` if a user row was updated
    pub async fn unlock_user(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET account_non_locked = 1, failed_login_attempts = 0, updated_at = ? \
             WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Enables or disables a user account.
    ///
    /// # Returns
    /// `true` if a user row was updated
    pub async fn set_enabled(&self, id: i64, enabled: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET enabled = ?, updated_at = ? WHERE id = ?")
            .bind(enabled)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Retrieves the typed role set assigned to a user.
    ///
    /// Unknown role names in storage are skipped with a warning rather than
    /// failing the lookup.
    pub async fn get_roles_for_user(&self, user_id: i64) -> Result<Vec<Role>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.name FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = ?
            ORDER BY r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let roles = names
            .iter()
            .filter_map(|name| match Role::from_str(name) {
                Ok(role) => Some(role),
                Err(_) => {
                    warn!(role = %name, user_id, "Skipping unknown role name in storage");
                    None
                }
            })
            .collect();

        Ok(roles)
    }

    /// Assigns a role to a user. Idempotent.
    pub async fn assign_role(&self, user_id: i64, role: Role) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO user_roles (user_id, role_id) \
             SELECT ?, id FROM roles WHERE name = ?",
        )
        .bind(user_id)
        .bind(role.authority())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Replaces a user's role set.
    pub async fn replace_roles(&self, user_id: i64, roles: &[Role]) -> Result<()> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        for role in roles {
            self.assign_role(user_id, *role).await?;
        }

        Ok(())
    }
}
