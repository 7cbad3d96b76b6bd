//! Core business logic for the authentication system.
//!
//! Credential verification, lockout bookkeeping, session issuance and the
//! refresh flow live here. Outcomes are closed enums returned by value; the
//! handlers perform a single mapping from variant to HTTP response, so no
//! security-relevant failure ever escapes as a raw error.

use crate::database::models::{Role, User};
use crate::errors::ServiceResult;
use crate::repositories::user_repository::UserRepository;
use crate::services::user_service::UserService;
use crate::utils::jwt::JwtCodec;
use sqlx::SqlitePool;
use tracing::{debug, error, warn};

/// Failed attempts after which an account is locked.
pub const MAX_FAILED_ATTEMPTS: i64 = 5;

/// Result of a credential check. `NotFound` and `BadPassword` are
/// distinguished internally for logging and failure tracking but must be
/// presented identically to clients.
#[derive(Debug)]
pub enum CredentialOutcome {
    Ok(Box<User>),
    NotFound,
    BadPassword,
    Locked,
    Disabled,
}

/// Result of a refresh attempt. Handlers collapse every rejection variant
/// into one uniform unauthorized response.
#[derive(Debug)]
pub enum RefreshOutcome {
    Renewed { access_token: String },
    InvalidToken,
    UnknownSubject,
    Locked,
    Disabled,
}

/// The freshly minted token pair plus the role set at issuance time.
#[derive(Debug)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub roles: Vec<Role>,
}

/// Authentication service for credential verification, lockout tracking and
/// session issuance.
pub struct AuthService<'a> {
    pool: &'a SqlitePool,
    codec: &'a JwtCodec,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService instance
    pub fn new(pool: &'a SqlitePool, codec: &'a JwtCodec) -> Self {
        AuthService { pool, codec }
    }

    /// Verifies a username-or-email plus password pair.
    ///
    /// Lookup order: username first, then email. Account-state flags are
    /// checked before the password so a locked or disabled account reports
    /// its state regardless of password correctness. No side effects; the
    /// failure tracker applies them based on the outcome.
    pub async fn verify_credentials(
        &self,
        identifier: &str,
        password: &str,
    ) -> ServiceResult<CredentialOutcome> {
        let normalized = identifier.trim().to_lowercase();
        let repo = UserRepository::new(self.pool);

        let user = match repo.get_user_by_username(&normalized).await? {
            Some(user) => Some(user),
            None => repo.get_user_by_email(&normalized).await?,
        };

        let Some(user) = user else {
            debug!(identifier = %normalized, "Login attempt for unknown identifier");
            return Ok(CredentialOutcome::NotFound);
        };

        if !user.enabled {
            warn!(username = %user.username, "Login attempt for disabled account");
            return Ok(CredentialOutcome::Disabled);
        }

        if !user.account_non_locked {
            warn!(username = %user.username, "Login attempt for locked account");
            return Ok(CredentialOutcome::Locked);
        }

        if UserService::verify_password(password, &user.password_hash)? {
            Ok(CredentialOutcome::Ok(Box::new(user)))
        } else {
            debug!(username = %user.username, "Login attempt with bad password");
            Ok(CredentialOutcome::BadPassword)
        }
    }

    /// Records a failed login attempt, locking the account once the
    /// threshold is reached.
    ///
    /// Best-effort: a storage failure here is logged and swallowed so the
    /// caller's credential-failure response is never disturbed.
    pub async fn record_failed_login(&self, identifier: &str) {
        let normalized = identifier.trim().to_lowercase();
        let repo = UserRepository::new(self.pool);

        if let Err(e) = repo
            .record_failed_attempt(&normalized, MAX_FAILED_ATTEMPTS)
            .await
        {
            error!(identifier = %normalized, "Failed to record login failure: {}", e);
        }
    }

    /// Resets the failure counter and stamps last-login after a successful
    /// authentication. Best-effort, same as failure recording.
    pub async fn record_successful_login(&self, username: &str) {
        let repo = UserRepository::new(self.pool);

        if let Err(e) = repo.record_successful_login(username).await {
            error!(username, "Failed to update last login: {}", e);
        }
    }

    /// Mints the access/refresh token pair for a verified user.
    ///
    /// The access token carries the user's current role names; the refresh
    /// token carries only the subject. Cookie placement is the caller's
    /// concern.
    pub async fn issue_session(&self, user: &User) -> ServiceResult<SessionTokens> {
        let repo = UserRepository::new(self.pool);
        let roles = repo.get_roles_for_user(user.id).await?;

        let access_token = self.codec.issue(&self.codec.access_claims(user, &roles))?;
        let refresh_token = self
            .codec
            .issue(&self.codec.refresh_claims(&user.username))?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
            roles,
        })
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// The token must verify and carry the refresh kind marker. The subject
    /// is then re-resolved from storage so the new access token reflects the
    /// user's current roles, and the enabled/locked flags are re-checked: a
    /// user disabled or locked after obtaining a refresh token cannot keep
    /// refreshing. The refresh token itself is not rotated.
    pub async fn refresh_session(&self, refresh_token: &str) -> ServiceResult<RefreshOutcome> {
        let claims = match self.codec.verify(refresh_token) {
            Ok(claims) => claims,
            Err(_) => return Ok(RefreshOutcome::InvalidToken),
        };

        if !claims.is_refresh() {
            warn!(subject = %claims.sub, "Refresh attempt with a non-refresh token");
            return Ok(RefreshOutcome::InvalidToken);
        }

        let repo = UserRepository::new(self.pool);
        let Some(user) = repo.get_user_by_username(&claims.sub).await? else {
            warn!(subject = %claims.sub, "Refresh token subject no longer exists");
            return Ok(RefreshOutcome::UnknownSubject);
        };

        if !user.enabled {
            warn!(username = %user.username, "Refresh attempt for disabled account");
            return Ok(RefreshOutcome::Disabled);
        }

        if !user.account_non_locked {
            warn!(username = %user.username, "Refresh attempt for locked account");
            return Ok(RefreshOutcome::Locked);
        }

        let roles = repo.get_roles_for_user(user.id).await?;
        let access_token = self.codec.issue(&self.codec.access_claims(&user, &roles))?;

        Ok(RefreshOutcome::Renewed { access_token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::SignupRequest;
    use crate::repositories::user_repository::UserRepository;
    use crate::services::user_service::UserService;
    use chrono::Utc;
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

    fn test_codec() -> JwtCodec {
        JwtCodec::new(b"service-test-secret-0123456789abcdef", 86_400_000, 604_800_000)
    }

    async fn register_user(pool: &SqlitePool, username: &str) -> User {
        let (user, _) = UserService::new(pool)
            .register(SignupRequest {
                username: username.to_string(),
                email: format!("{}@hrms.local", username),
                password: "Secret#123".to_string(),
                confirm_password: "Secret#123".to_string(),
                full_name: "Test User".to_string(),
                roles: None,
            })
            .await
            .unwrap();
        user
    }

    #[tokio::test]
    async fn test_credential_outcomes() {
        let pool = test_pool().await;
        let codec = test_codec();
        let service = AuthService::new(&pool, &codec);
        register_user(&pool, "eve").await;

        assert!(matches!(
            service.verify_credentials("nobody", "whatever").await.unwrap(),
            CredentialOutcome::NotFound
        ));
        assert!(matches!(
            service.verify_credentials("eve", "wrong").await.unwrap(),
            CredentialOutcome::BadPassword
        ));
        assert!(matches!(
            service.verify_credentials("eve", "Secret#123").await.unwrap(),
            CredentialOutcome::Ok(_)
        ));
        // Email works as identifier, with surrounding whitespace and case noise
        assert!(matches!(
            service
                .verify_credentials("  EVE@hrms.local ", "Secret#123")
                .await
                .unwrap(),
            CredentialOutcome::Ok(_)
        ));
    }

    #[tokio::test]
    async fn test_disabled_account_reported_before_password_check() {
        let pool = test_pool().await;
        let codec = test_codec();
        let service = AuthService::new(&pool, &codec);
        let user = register_user(&pool, "frank").await;

        UserRepository::new(&pool)
            .set_enabled(user.id, false)
            .await
            .unwrap();

        assert!(matches!(
            service.verify_credentials("frank", "Secret#123").await.unwrap(),
            CredentialOutcome::Disabled
        ));
        assert!(matches!(
            service.verify_credentials("frank", "wrong").await.unwrap(),
            CredentialOutcome::Disabled
        ));
    }

    #[tokio::test]
    async fn test_lockout_after_five_failures() {
        let pool = test_pool().await;
        let codec = test_codec();
        let service = AuthService::new(&pool, &codec);
        register_user(&pool, "grace").await;

        for _ in 0..MAX_FAILED_ATTEMPTS {
            assert!(matches!(
                service.verify_credentials("grace", "wrong").await.unwrap(),
                CredentialOutcome::BadPassword
            ));
            service.record_failed_login("grace").await;
        }

        // Sixth attempt is rejected as Locked even with the correct password
        assert!(matches!(
            service.verify_credentials("grace", "Secret#123").await.unwrap(),
            CredentialOutcome::Locked
        ));

        let user = UserRepository::new(&pool)
            .get_user_by_username("grace")
            .await
            .unwrap()
            .unwrap();
        assert!(!user.account_non_locked);
        assert_eq!(user.failed_login_attempts, MAX_FAILED_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_successful_login_resets_failure_counter() {
        let pool = test_pool().await;
        let codec = test_codec();
        let service = AuthService::new(&pool, &codec);
        register_user(&pool, "heidi").await;

        service.record_failed_login("heidi").await;
        service.record_failed_login("heidi").await;

        let repo = UserRepository::new(&pool);
        let user = repo.get_user_by_username("heidi").await.unwrap().unwrap();
        assert_eq!(user.failed_login_attempts, 2);
        assert!(user.last_login.is_none());

        service.record_successful_login("heidi").await;

        let user = repo.get_user_by_username("heidi").await.unwrap().unwrap();
        assert_eq!(user.failed_login_attempts, 0);
        assert!(user.last_login.is_some());
    }

    #[tokio::test]
    async fn test_admin_unlock_restores_access() {
        let pool = test_pool().await;
        let codec = test_codec();
        let service = AuthService::new(&pool, &codec);
        let user = register_user(&pool, "ivan").await;

        for _ in 0..MAX_FAILED_ATTEMPTS {
            service.record_failed_login("ivan").await;
        }
        assert!(matches!(
            service.verify_credentials("ivan", "Secret#123").await.unwrap(),
            CredentialOutcome::Locked
        ));

        UserService::new(&pool).unlock_account(user.id).await.unwrap();

        assert!(matches!(
            service.verify_credentials("ivan", "Secret#123").await.unwrap(),
            CredentialOutcome::Ok(_)
        ));
        let user = UserRepository::new(&pool)
            .get_user_by_username("ivan")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.failed_login_attempts, 0);
    }

    #[tokio::test]
    async fn test_issue_session_produces_both_tokens() {
        let pool = test_pool().await;
        let codec = test_codec();
        let service = AuthService::new(&pool, &codec);
        let user = register_user(&pool, "judy").await;

        let tokens = service.issue_session(&user).await.unwrap();
        assert_eq!(tokens.roles, vec![Role::Employee]);

        let access = codec.verify(&tokens.access_token).unwrap();
        assert_eq!(access.sub, "judy");
        assert_eq!(access.roles, vec!["EMPLOYEE"]);
        assert!(!access.is_refresh());

        let refresh = codec.verify(&tokens.refresh_token).unwrap();
        assert_eq!(refresh.sub, "judy");
        assert!(refresh.is_refresh());
        assert!(refresh.roles.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let pool = test_pool().await;
        let codec = test_codec();
        let service = AuthService::new(&pool, &codec);
        let user = register_user(&pool, "karl").await;

        let tokens = service.issue_session(&user).await.unwrap();
        // An access token is validly signed and unexpired, but lacks the
        // refresh kind marker.
        assert!(matches!(
            service.refresh_session(&tokens.access_token).await.unwrap(),
            RefreshOutcome::InvalidToken
        ));
        assert!(matches!(
            service.refresh_session("garbage").await.unwrap(),
            RefreshOutcome::InvalidToken
        ));
    }

    #[tokio::test]
    async fn test_refresh_reflects_current_roles() {
        let pool = test_pool().await;
        let codec = test_codec();
        let service = AuthService::new(&pool, &codec);
        let user = register_user(&pool, "lena").await;

        let tokens = service.issue_session(&user).await.unwrap();
        let old_access = codec.verify(&tokens.access_token).unwrap();
        assert_eq!(old_access.roles, vec!["EMPLOYEE"]);

        UserRepository::new(&pool)
            .replace_roles(user.id, &[Role::Hr, Role::Manager])
            .await
            .unwrap();

        let RefreshOutcome::Renewed { access_token } =
            service.refresh_session(&tokens.refresh_token).await.unwrap()
        else {
            panic!("refresh should succeed");
        };

        let new_access = codec.verify(&access_token).unwrap();
        assert_eq!(new_access.roles, vec!["HR", "MANAGER"]);
        // The old, still-live access token keeps its issuance-time roles
        assert_eq!(codec.verify(&tokens.access_token).unwrap().roles, vec!["EMPLOYEE"]);
    }

    #[tokio::test]
    async fn test_refresh_rejects_disabled_locked_or_deleted_subject() {
        let pool = test_pool().await;
        let codec = test_codec();
        let service = AuthService::new(&pool, &codec);
        let user = register_user(&pool, "mallory").await;
        let tokens = service.issue_session(&user).await.unwrap();

        let repo = UserRepository::new(&pool);
        repo.set_enabled(user.id, false).await.unwrap();
        assert!(matches!(
            service.refresh_session(&tokens.refresh_token).await.unwrap(),
            RefreshOutcome::Disabled
        ));

        repo.set_enabled(user.id, true).await.unwrap();
        for _ in 0..MAX_FAILED_ATTEMPTS {
            repo.record_failed_attempt("mallory", MAX_FAILED_ATTEMPTS)
                .await
                .unwrap();
        }
        assert!(matches!(
            service.refresh_session(&tokens.refresh_token).await.unwrap(),
            RefreshOutcome::Locked
        ));

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();
        assert!(matches!(
            service.refresh_session(&tokens.refresh_token).await.unwrap(),
            RefreshOutcome::UnknownSubject
        ));
    }

    #[tokio::test]
    async fn test_failure_recording_swallows_storage_errors() {
        let pool = test_pool().await;
        let codec = test_codec();
        let service = AuthService::new(&pool, &codec);
        register_user(&pool, "oscar").await;

        pool.close().await;

        // Best-effort bookkeeping: both calls return normally, the storage
        // error is logged only.
        service.record_failed_login("oscar").await;
        service.record_successful_login("oscar").await;

        // The authentication decision path surfaces the failure instead.
        assert!(
            service
                .verify_credentials("oscar", "Secret#123")
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_expired_refresh_token_rejected() {
        let pool = test_pool().await;
        // Zero refresh lifetime: the token is expired the moment it is minted.
        let codec = JwtCodec::new(b"service-test-secret-0123456789abcdef", 86_400_000, 0);
        let service = AuthService::new(&pool, &codec);
        register_user(&pool, "nina").await;

        let mut claims = codec.refresh_claims("nina");
        claims.iat = Utc::now().timestamp() - 120;
        claims.exp = Utc::now().timestamp() - 60;
        let expired = codec.issue(&claims).unwrap();

        assert!(matches!(
            service.refresh_session(&expired).await.unwrap(),
            RefreshOutcome::InvalidToken
        ));
    }
}
