//! User account business logic.
//!
//! Handles registration, password hashing, and the administrative account
//! operations (unlock, enable/disable) that back the admin API.

use crate::api::common::validation_errors_to_message;
use crate::auth::models::SignupRequest;
use crate::database::models::{CreateUser, Role, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use bcrypt::{DEFAULT_COST, hash, verify};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;
use validator::Validate;

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserService<'a> {
    /// Creates a new UserService instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Registers a new user account.
    ///
    /// Validates the request, enforces the password-confirmation check and
    /// the username/email uniqueness contract, hashes the password, and
    /// assigns the requested roles (defaulting to EMPLOYEE).
    ///
    /// # Errors
    /// - `ServiceError::Validation` for malformed input or mismatched
    ///   password confirmation
    /// - `ServiceError::AlreadyExists` when the username or email is taken
    /// - `ServiceError::NotFound` when a requested role name is unknown
    pub async fn register(&self, signup: SignupRequest) -> ServiceResult<(User, Vec<Role>)> {
        if let Err(validation_errors) = signup.validate() {
            return Err(ServiceError::validation(validation_errors_to_message(
                validation_errors,
            )));
        }

        if signup.password != signup.confirm_password {
            return Err(ServiceError::validation(
                "Password and confirmation password do not match",
            ));
        }

        let username = signup.username.trim().to_lowercase();
        let email = signup.email.trim().to_lowercase();

        let repo = UserRepository::new(self.pool);

        if repo.username_exists(&username).await? {
            return Err(ServiceError::already_exists("Username", &username));
        }

        if repo.email_exists(&email).await? {
            return Err(ServiceError::already_exists("Email", &email));
        }

        let roles = Self::resolve_roles(signup.roles.as_deref())?;

        let password_hash = Self::hash_password(&signup.password)?;

        let user = repo
            .create_user(CreateUser {
                username,
                email,
                password_hash,
                full_name: signup.full_name,
                enabled: true,
            })
            .await?;

        for role in &roles {
            repo.assign_role(user.id, *role).await?;
        }

        info!(user_id = user.id, username = %user.username, "Registered new user account");

        Ok((user, roles))
    }

    /// Unlocks a user account and resets its failed-login counter.
    /// Administrative operation.
    pub async fn unlock_account(&self, user_id: i64) -> ServiceResult<()> {
        let repo = UserRepository::new(self.pool);
        if !repo.unlock_user(user_id).await? {
            return Err(ServiceError::not_found("User", user_id.to_string()));
        }

        info!(user_id, "User account unlocked");
        Ok(())
    }

    /// Enables or disables a user account. Administrative operation.
    pub async fn set_account_status(&self, user_id: i64, enabled: bool) -> ServiceResult<()> {
        let repo = UserRepository::new(self.pool);
        if !repo.set_enabled(user_id, enabled).await? {
            return Err(ServiceError::not_found("User", user_id.to_string()));
        }

        info!(user_id, enabled, "User account status changed");
        Ok(())
    }

    /// Checks if a username is available for registration.
    pub async fn is_username_available(&self, username: &str) -> ServiceResult<bool> {
        let repo = UserRepository::new(self.pool);
        let exists = repo
            .username_exists(&username.trim().to_lowercase())
            .await?;
        Ok(!exists)
    }

    /// Checks if an email is available for registration.
    pub async fn is_email_available(&self, email: &str) -> ServiceResult<bool> {
        let repo = UserRepository::new(self.pool);
        let exists = repo.email_exists(&email.trim().to_lowercase()).await?;
        Ok(!exists)
    }

    /// Hashes a password before storing it.
    pub(crate) fn hash_password(password: &str) -> ServiceResult<String> {
        hash(password, DEFAULT_COST)
            .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {}", e)))
    }

    /// Verifies a plaintext password against the stored hash.
    pub(crate) fn verify_password(password: &str, hashed: &str) -> ServiceResult<bool> {
        verify(password, hashed).map_err(|e| {
            ServiceError::internal_error(format!("Password verification failed: {}", e))
        })
    }

    /// Maps requested role names to the typed role set; no roles requested
    /// means the default EMPLOYEE role.
    fn resolve_roles(requested: Option<&[String]>) -> ServiceResult<Vec<Role>> {
        match requested {
            None | Some([]) => Ok(vec![Role::Employee]),
            Some(names) => {
                let mut roles = Vec::with_capacity(names.len());
                for name in names {
                    let role = Role::from_str(name)
                        .map_err(|_| ServiceError::not_found("Role", name.clone()))?;
                    if !roles.contains(&role) {
                        roles.push(role);
                    }
                }
                Ok(roles)
            }
        }
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

    fn signup(username: &str, email: &str) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "Secret#123".to_string(),
            confirm_password: "Secret#123".to_string(),
            full_name: "Test User".to_string(),
            roles: None,
        }
    }

    #[tokio::test]
    async fn test_register_assigns_default_employee_role() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);

        let (user, roles) = service
            .register(signup("alice", "alice@hrms.local"))
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert!(user.enabled);
        assert_eq!(roles, vec![Role::Employee]);

        let stored = UserRepository::new(&pool)
            .get_roles_for_user(user.id)
            .await
            .unwrap();
        assert_eq!(stored, vec![Role::Employee]);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_username_and_email() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);

        service
            .register(signup("bob", "bob@hrms.local"))
            .await
            .unwrap();

        let err = service
            .register(signup("bob", "other@hrms.local"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));

        let err = service
            .register(signup("bob2", "bob@hrms.local"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_register_rejects_mismatched_confirmation() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);

        let mut request = signup("carol", "carol@hrms.local");
        request.confirm_password = "different".to_string();

        let err = service.register(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_register_rejects_unknown_role() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);

        let mut request = signup("dave", "dave@hrms.local");
        request.roles = Some(vec!["SUPERUSER".to_string()]);

        let err = service.register(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_username_and_email_availability() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);

        assert!(!service.is_username_available("admin").await.unwrap());
        assert!(service.is_username_available("newuser").await.unwrap());
        assert!(
            !service
                .is_email_available("admin@hrms.local")
                .await
                .unwrap()
        );
        assert!(service.is_email_available("new@hrms.local").await.unwrap());
    }
}
