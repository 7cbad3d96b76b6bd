//! Middleware for protecting authenticated routes and handling authorization.
//!
//! The identity resolver rebuilds the caller's identity from the access-token
//! cookie on every request, purely from verified claims: no storage access
//! happens on this path, so authorization keeps working even when the
//! database is unreachable. The resolved context is threaded through the
//! request as an extension value, never held in ambient global state.

use crate::api::common::error_response;
use crate::auth::models::AuthenticatedUser;
use crate::database::models::Role;
use crate::utils::cookies::ACCESS_TOKEN_COOKIE;
use crate::utils::jwt::JwtCodec;
use axum::{
    Json,
    extract::{Extension, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

/// Resolves the request identity from the access-token cookie.
///
/// Absent, malformed and expired tokens all resolve to `None` (anonymous):
/// protected-route middleware rejects them uniformly rather than
/// distinguishing the failure kind. The specific subtype is logged by the
/// codec for diagnosis.
pub fn resolve_identity(jar: &CookieJar, codec: &JwtCodec) -> Option<AuthenticatedUser> {
    let cookie = jar.get(ACCESS_TOKEN_COOKIE)?;
    let token = cookie.value();
    if token.is_empty() {
        return None;
    }

    let claims = codec.verify(token).ok()?;
    AuthenticatedUser::from_claims(&claims)
}

/// The standardized response for unauthenticated access to a protected
/// route. Identical whether the token was missing, malformed or expired.
pub fn unauthorized_response(path: &str) -> Response {
    let body = json!({
        "error": "Unauthorized",
        "message": "Authentication required to access this resource",
        "status": StatusCode::UNAUTHORIZED.as_u16(),
        "timestamp": chrono::Utc::now().timestamp_millis(),
        "path": path,
    });

    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

/// Authentication middleware: rejects requests that do not resolve an
/// identity, and makes the identity context available to handlers.
pub async fn require_auth(
    Extension(codec): Extension<JwtCodec>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_identity(&jar, &codec) {
        Some(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        None => unauthorized_response(request.uri().path()),
    }
}

/// Like [`require_auth`] but never rejects: anonymous requests pass through
/// without an identity extension. For routes that personalize when a session
/// is present but remain publicly reachable.
pub async fn optional_auth(
    Extension(codec): Extension<JwtCodec>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(identity) = resolve_identity(&jar, &codec) {
        request.extensions_mut().insert(identity);
    }
    next.run(request).await
}

/// Admin role authorization middleware; must run after [`require_auth`].
pub async fn require_admin(request: Request, next: Next) -> Response {
    let Some(identity) = request.extensions().get::<AuthenticatedUser>() else {
        return unauthorized_response(request.uri().path());
    };

    if !identity.has_role(Role::Admin) {
        let (status, body) = error_response(
            StatusCode::FORBIDDEN,
            "permission_denied",
            "Administrator role required",
        );
        return (status, body).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::User;
    use axum_extra::extract::cookie::Cookie;
    use chrono::Utc;

    fn test_codec() -> JwtCodec {
        JwtCodec::new(b"middleware-test-secret-0123456789", 86_400_000, 604_800_000)
    }

    fn test_user() -> User {
        let now = Utc::now();
        User {
            id: 1,
            username: "admin".to_string(),
            email: "admin@hrms.local".to_string(),
            password_hash: "$2b$12$unused".to_string(),
            full_name: "System Administrator".to_string(),
            enabled: true,
            account_non_locked: true,
            credentials_non_expired: true,
            account_non_expired: true,
            failed_login_attempts: 0,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn jar_with_access_token(token: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(ACCESS_TOKEN_COOKIE, token.to_string()))
    }

    #[test]
    fn test_valid_token_resolves_identity_without_storage() {
        let codec = test_codec();
        let token = codec
            .issue(&codec.access_claims(&test_user(), &[Role::Admin, Role::Hr]))
            .unwrap();

        let identity = resolve_identity(&jar_with_access_token(&token), &codec).unwrap();
        assert_eq!(identity.username, "admin");
        assert_eq!(identity.roles, vec![Role::Admin, Role::Hr]);
    }

    #[test]
    fn test_missing_cookie_is_anonymous() {
        let codec = test_codec();
        assert!(resolve_identity(&CookieJar::new(), &codec).is_none());
    }

    #[test]
    fn test_expired_token_is_anonymous() {
        let codec = test_codec();
        let mut claims = codec.access_claims(&test_user(), &[Role::Admin]);
        claims.iat = Utc::now().timestamp() - 120;
        claims.exp = Utc::now().timestamp() - 60;
        let token = codec.issue(&claims).unwrap();

        assert!(resolve_identity(&jar_with_access_token(&token), &codec).is_none());
    }

    #[test]
    fn test_garbage_token_is_anonymous() {
        let codec = test_codec();
        assert!(resolve_identity(&jar_with_access_token("not-a-token"), &codec).is_none());
        assert!(resolve_identity(&jar_with_access_token(""), &codec).is_none());
    }

    #[test]
    fn test_refresh_token_in_access_cookie_is_anonymous() {
        let codec = test_codec();
        let token = codec.issue(&codec.refresh_claims("admin")).unwrap();
        assert!(resolve_identity(&jar_with_access_token(&token), &codec).is_none());
    }

    #[tokio::test]
    async fn test_optional_auth_admits_anonymous_and_identified_requests() {
        use axum::{Router, body::Body, http::Request, routing::get};
        use http_body_util::BodyExt;
        use tower::ServiceExt;

        async fn probe(identity: Option<Extension<AuthenticatedUser>>) -> String {
            match identity {
                Some(Extension(user)) => user.username,
                None => "anonymous".to_string(),
            }
        }

        let codec = test_codec();
        let token = codec
            .issue(&codec.access_claims(&test_user(), &[Role::Admin]))
            .unwrap();

        let app = Router::new()
            .route("/probe", get(probe))
            .layer(axum::middleware::from_fn(optional_auth))
            .layer(Extension(codec));

        let anonymous = app
            .clone()
            .oneshot(Request::builder().uri("/probe").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = anonymous.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"anonymous");

        let identified = app
            .oneshot(
                Request::builder()
                    .uri("/probe")
                    .header("cookie", format!("{ACCESS_TOKEN_COOKIE}={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = identified.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"admin");
    }
}
