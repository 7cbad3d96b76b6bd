//! Handler functions for administrative user-management endpoints.
//!
//! These endpoints sit behind both the authentication and the admin-role
//! middleware: only an administrator can unlock an account or change its
//! enabled status.

use crate::api::common::{ApiResponse, service_error_to_http};
use crate::auth::models::AuthenticatedUser;
use crate::database::models::RoleRecord;
use crate::errors::ServiceError;
use crate::repositories::role_repository::RoleRepository;
use crate::services::user_service::UserService;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::Json as ResponseJson,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct SetAccountStatusRequest {
    pub enabled: bool,
}

/// List the roles assignable to user accounts.
#[axum::debug_handler]
pub async fn list_roles(
    Extension(pool): Extension<SqlitePool>,
) -> Result<ResponseJson<ApiResponse<Vec<RoleRecord>>>, (StatusCode, String)> {
    match RoleRepository::new(&pool).get_all_roles().await {
        Ok(roles) => Ok(ResponseJson(ApiResponse::success(
            roles,
            "Roles retrieved successfully",
        ))),
        Err(error) => Err(service_error_to_http(ServiceError::from(error))),
    }
}

/// Unlock a locked user account and reset its failed-login counter.
#[axum::debug_handler]
pub async fn unlock_user(
    Extension(pool): Extension<SqlitePool>,
    Extension(admin): Extension<AuthenticatedUser>,
    Path(user_id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<()>>, (StatusCode, String)> {
    let user_service = UserService::new(&pool);

    match user_service.unlock_account(user_id).await {
        Ok(()) => {
            info!(user_id, admin = %admin.username, "Account unlocked by administrator");
            Ok(ResponseJson(ApiResponse::success(
                (),
                "Account unlocked successfully",
            )))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Enable or disable a user account.
#[axum::debug_handler]
pub async fn set_user_status(
    Extension(pool): Extension<SqlitePool>,
    Extension(admin): Extension<AuthenticatedUser>,
    Path(user_id): Path<i64>,
    Json(payload): Json<SetAccountStatusRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, (StatusCode, String)> {
    let user_service = UserService::new(&pool);

    match user_service.set_account_status(user_id, payload.enabled).await {
        Ok(()) => {
            info!(
                user_id,
                enabled = payload.enabled,
                admin = %admin.username,
                "Account status changed by administrator"
            );
            let message = if payload.enabled {
                "Account enabled successfully"
            } else {
                "Account disabled successfully"
            };
            Ok(ResponseJson(ApiResponse::success((), message)))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}
