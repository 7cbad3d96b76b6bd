//! Handler functions for authentication-related API endpoints.
//!
//! These functions process login, registration, token refresh, logout and
//! token validation requests. They own the cookie transport: the service
//! layer mints opaque token strings and the handlers place them in, or clear
//! them from, the HTTP-only cookies.

use crate::api::common::{
    ApiResponse, error_response, service_error_to_http, validation_error_response,
};
use crate::auth::models::*;
use crate::auth::service::{AuthService, CredentialOutcome, RefreshOutcome};
use crate::config::Config;
use crate::services::user_service::UserService;
use crate::utils::cookies::{
    ACCESS_TOKEN_COOKIE, ACCESS_TOKEN_MAX_AGE_SECS, REFRESH_TOKEN_COOKIE,
    REFRESH_TOKEN_MAX_AGE_SECS, auth_cookie, clear_cookie,
};
use crate::utils::jwt::JwtCodec;
use axum::{
    extract::{Extension, Json, Query},
    http::StatusCode,
    response::Json as ResponseJson,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{error, info, warn};
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

/// Handle user login request.
///
/// On success both session cookies are set and the response body carries the
/// identity summary. Unknown identifiers and bad passwords are presented
/// identically to prevent account enumeration; locked and disabled accounts
/// get their own statuses.
#[axum::debug_handler]
pub async fn login(
    Extension(pool): Extension<SqlitePool>,
    Extension(codec): Extension<JwtCodec>,
    Extension(config): Extension<Config>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, ResponseJson<ApiResponse<LoginResponse>>), (StatusCode, String)> {
    if let Err(validation_errors) = payload.validate() {
        return Err(validation_error_response(validation_errors));
    }

    let identifier = payload.normalized_identifier();
    let auth_service = AuthService::new(&pool, &codec);

    let outcome = match auth_service
        .verify_credentials(&identifier, &payload.password)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(identifier = %identifier, "Credential verification failed: {}", e);
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "service_unavailable",
                "Authentication service unavailable",
            ));
        }
    };

    let user = match outcome {
        CredentialOutcome::Ok(user) => user,
        CredentialOutcome::NotFound | CredentialOutcome::BadPassword => {
            auth_service.record_failed_login(&identifier).await;
            return Err(error_response(
                StatusCode::UNAUTHORIZED,
                "bad_credentials",
                "Invalid username/email or password",
            ));
        }
        CredentialOutcome::Locked => {
            return Err(error_response(
                StatusCode::LOCKED,
                "account_locked",
                "Account is locked due to multiple failed login attempts",
            ));
        }
        CredentialOutcome::Disabled => {
            return Err(error_response(
                StatusCode::FORBIDDEN,
                "account_disabled",
                "Account is disabled",
            ));
        }
    };

    let tokens = match auth_service.issue_session(&user).await {
        Ok(tokens) => tokens,
        Err(e) => {
            error!(username = %user.username, "Session issuance failed: {}", e);
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "service_unavailable",
                "Authentication service unavailable",
            ));
        }
    };

    auth_service.record_successful_login(&user.username).await;

    let jar = jar
        .add(auth_cookie(
            ACCESS_TOKEN_COOKIE,
            tokens.access_token,
            ACCESS_TOKEN_MAX_AGE_SECS,
            config.cookie_secure,
        ))
        .add(auth_cookie(
            REFRESH_TOKEN_COOKIE,
            tokens.refresh_token,
            REFRESH_TOKEN_MAX_AGE_SECS,
            config.cookie_secure,
        ));

    let now_ms = chrono::Utc::now().timestamp_millis();
    let response = LoginResponse {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        roles: tokens.roles,
        enabled: user.enabled,
        account_non_locked: user.account_non_locked,
        expires_at: now_ms + config.jwt_expires_in_ms as i64,
        refresh_expires_at: now_ms + config.jwt_refresh_expires_in_ms as i64,
    };

    info!(username = %user.username, "User authenticated, session cookies set");

    Ok((
        jar,
        ResponseJson(ApiResponse::success(
            response,
            "Login successful - authentication cookies set",
        )),
    ))
}

/// Handle user registration request
#[axum::debug_handler]
pub async fn register(
    Extension(pool): Extension<SqlitePool>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<RegisterResponse>>), (StatusCode, String)> {
    let user_service = UserService::new(&pool);

    match user_service.register(payload).await {
        Ok((user, roles)) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(
                RegisterResponse {
                    id: user.id,
                    username: user.username,
                    email: user.email,
                    roles,
                },
                "User registered successfully! You can now login with your credentials.",
            )),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle token refresh request.
///
/// Cookie-only: the refresh token is read from its cookie and the rotated
/// access token is written back as a cookie. Every rejection reason maps to
/// the same unauthorized response.
#[axum::debug_handler]
pub async fn refresh_token(
    Extension(pool): Extension<SqlitePool>,
    Extension(codec): Extension<JwtCodec>,
    Extension(config): Extension<Config>,
    jar: CookieJar,
) -> Result<(CookieJar, ResponseJson<ApiResponse<RefreshResponse>>), (StatusCode, String)> {
    let Some(cookie) = jar.get(REFRESH_TOKEN_COOKIE) else {
        return Err(error_response(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Refresh token not found in cookies",
        ));
    };
    let refresh_token = cookie.value().to_string();

    let auth_service = AuthService::new(&pool, &codec);
    let outcome = match auth_service.refresh_session(&refresh_token).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Token refresh failed: {}", e);
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "service_unavailable",
                "Authentication service unavailable",
            ));
        }
    };

    match outcome {
        RefreshOutcome::Renewed { access_token } => {
            let jar = jar.add(auth_cookie(
                ACCESS_TOKEN_COOKIE,
                access_token,
                ACCESS_TOKEN_MAX_AGE_SECS,
                config.cookie_secure,
            ));

            let response = RefreshResponse {
                expires_at: chrono::Utc::now().timestamp_millis() + config.jwt_expires_in_ms as i64,
            };

            Ok((
                jar,
                ResponseJson(ApiResponse::success(
                    response,
                    "Access token refreshed successfully",
                )),
            ))
        }
        rejected => {
            warn!(?rejected, "Refresh attempt rejected");
            Err(error_response(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Invalid or expired refresh token",
            ))
        }
    }
}

/// Handle logout request: clears both authentication cookies.
#[axum::debug_handler]
pub async fn logout(
    Extension(config): Extension<Config>,
    jar: CookieJar,
) -> (CookieJar, ResponseJson<ApiResponse<()>>) {
    let jar = jar
        .add(clear_cookie(ACCESS_TOKEN_COOKIE, config.cookie_secure))
        .add(clear_cookie(REFRESH_TOKEN_COOKIE, config.cookie_secure));

    (
        jar,
        ResponseJson(ApiResponse::success(
            (),
            "Logout successful - authentication cookies cleared",
        )),
    )
}

/// Validate a token and report its remaining lifetime. Utility surface for
/// clients that want to probe session state without a full API call.
#[axum::debug_handler]
pub async fn validate_token(
    Extension(codec): Extension<JwtCodec>,
    Query(query): Query<TokenQuery>,
) -> Result<ResponseJson<ApiResponse<TokenValidationResponse>>, (StatusCode, String)> {
    match codec.verify(&query.token) {
        Ok(claims) => Ok(ResponseJson(ApiResponse::success(
            TokenValidationResponse {
                remaining_time_ms: claims.remaining_lifetime_ms(),
                username: claims.sub,
            },
            "Token is valid",
        ))),
        Err(_) => Err(error_response(
            StatusCode::UNAUTHORIZED,
            "invalid_token",
            "Token is invalid or expired",
        )),
    }
}

/// Check if a username is available for registration
#[axum::debug_handler]
pub async fn check_username(
    Extension(pool): Extension<SqlitePool>,
    Query(query): Query<UsernameQuery>,
) -> Result<ResponseJson<ApiResponse<AvailabilityResponse>>, (StatusCode, String)> {
    let user_service = UserService::new(&pool);

    match user_service.is_username_available(&query.username).await {
        Ok(available) => Ok(ResponseJson(ApiResponse::success(
            AvailabilityResponse {
                value: query.username,
                available,
            },
            "Username availability checked",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Check if an email is available for registration
#[axum::debug_handler]
pub async fn check_email(
    Extension(pool): Extension<SqlitePool>,
    Query(query): Query<EmailQuery>,
) -> Result<ResponseJson<ApiResponse<AvailabilityResponse>>, (StatusCode, String)> {
    let user_service = UserService::new(&pool);

    match user_service.is_email_available(&query.email).await {
        Ok(available) => Ok(ResponseJson(ApiResponse::success(
            AvailabilityResponse {
                value: query.email,
                available,
            },
            "Email availability checked",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Echo the request identity context.
///
/// Served entirely from the verified token claims: no storage access.
#[axum::debug_handler]
pub async fn me(
    Extension(identity): Extension<AuthenticatedUser>,
) -> ResponseJson<ApiResponse<AuthenticatedUser>> {
    ResponseJson(ApiResponse::ok(identity))
}
