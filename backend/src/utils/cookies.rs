//! Construction of the HTTP-only authentication cookies.
//!
//! Both session tokens travel exclusively in cookies: HttpOnly keeps them
//! out of reach of scripts, SameSite=Strict limits cross-site replay, and
//! the Secure flag is enabled behind HTTPS deployments via configuration.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Cookie carrying the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "hrms_access_token";

/// Cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "hrms_refresh_token";

/// Access-token cookie lifetime: 24 hours.
pub const ACCESS_TOKEN_MAX_AGE_SECS: i64 = 86_400;

/// Refresh-token cookie lifetime: 7 days.
pub const REFRESH_TOKEN_MAX_AGE_SECS: i64 = 604_800;

/// Builds an authentication cookie with the standard security flags.
pub fn auth_cookie(
    name: &'static str,
    value: String,
    max_age_secs: i64,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::seconds(max_age_secs))
        .build()
}

/// Builds a cookie that clears an existing auth cookie: empty value,
/// immediate expiry.
pub fn clear_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}
