//! Module for database connection setup and common utilities.
//!
//! This module is responsible for initializing the database connection pool,
//! running embedded migrations, and seeding the default roles and the
//! bootstrap administrator account.

use crate::config::Config;
use crate::database::models::Role;
use anyhow::Result;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::time::Duration;
use tracing::info;

pub mod models;

pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// Initializes the database connection pool.
    pub async fn new(config: &Config) -> Result<Self> {
        let database_url = &config.database_url;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(database_url)
            .await?;

        Ok(Database { pool })
    }

    /// Runs the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Database {
            pool: self.pool.clone(),
        }
    }
}

/// Inserts the fixed role set and, if absent, the bootstrap `admin` account
/// (roles ADMIN and HR). Idempotent: safe to run on every startup.
pub async fn seed_defaults(pool: &SqlitePool) -> Result<()> {
    for role in Role::ALL {
        sqlx::query("INSERT OR IGNORE INTO roles (name, description) VALUES (?, ?)")
            .bind(role.authority())
            .bind(role.description())
            .execute(pool)
            .await?;
    }

    let admin_exists: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = 'admin'")
            .fetch_one(pool)
            .await?;

    if admin_exists == 0 {
        let password_hash = bcrypt::hash("Admin@123", bcrypt::DEFAULT_COST)?;
        let now = chrono::Utc::now();

        let admin_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, email, password_hash, full_name, created_at, updated_at)
            VALUES ('admin', 'admin@hrms.local', ?, 'System Administrator', ?, ?)
            RETURNING id
            "#,
        )
        .bind(&password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        for role in [Role::Admin, Role::Hr] {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_id) \
                 SELECT ?, id FROM roles WHERE name = ?",
            )
            .bind(admin_id)
            .bind(role.authority())
            .execute(pool)
            .await?;
        }

        info!("Seeded default admin account");
    }

    Ok(())
}
