//! Database repository for role management operations.
//!
//! Provides read-only access to the fixed role set. Role names are stored
//! with the `ROLE_` authority prefix; callers work with the typed
//! [`Role`](crate::database::models::Role) enum.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::database::models::{Role, RoleRecord};

/// Repository for role database operations.
pub struct RoleRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> RoleRepository<'a> {
    /// Creates a new RoleRepository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Retrieves the stored record for a role.
    pub async fn get_role(&self, role: Role) -> Result<Option<RoleRecord>> {
        let record = sqlx::query_as::<_, RoleRecord>(
            "SELECT id, name, description FROM roles WHERE name = ?",
        )
        .bind(role.authority())
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// Retrieves all roles in the system.
    pub async fn get_all_roles(&self) -> Result<Vec<RoleRecord>> {
        let roles =
            sqlx::query_as::<_, RoleRecord>("SELECT id, name, description FROM roles ORDER BY id")
                .fetch_all(self.pool)
                .await?;

        Ok(roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        crate::database::seed_defaults(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_seeded_roles_are_all_present() {
        let pool = test_pool().await;
        let repo = RoleRepository::new(&pool);

        let records = repo.get_all_roles().await.unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["ROLE_ADMIN", "ROLE_HR", "ROLE_MANAGER", "ROLE_EMPLOYEE"]
        );
    }

    #[tokio::test]
    async fn test_get_role_by_typed_value() {
        let pool = test_pool().await;
        let repo = RoleRepository::new(&pool);

        let record = repo.get_role(Role::Hr).await.unwrap().unwrap();
        assert_eq!(record.name, "ROLE_HR");
        assert!(record.description.is_some());
    }
}
