//! JWT token utilities for authentication and authorization.
//!
//! Provides signed token creation, verification, and claims management for
//! user sessions. Tokens are signed with a symmetric HS256 key: issuer and
//! verifier share one trust boundary, so asymmetric keys would buy nothing
//! here. Expiry is the only invalidation mechanism; there is no revocation
//! list.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::Config;
use crate::database::models::{Role, User};
use crate::errors::ServiceError;

/// Claim value marking a token as a refresh token.
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// JWT claims carried by access and refresh tokens.
///
/// Access tokens carry the full identity (user id, email, full name, role
/// names); refresh tokens carry only the subject plus the `type` marker, so
/// that roles are re-resolved from storage at refresh time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Username
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    /// Token issued at timestamp (seconds)
    pub iat: i64,
    /// Token expiration timestamp (seconds)
    pub exp: i64,
    /// Token kind marker, present only on refresh tokens
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl Claims {
    pub fn is_refresh(&self) -> bool {
        self.token_type.as_deref() == Some(REFRESH_TOKEN_TYPE)
    }

    /// Remaining lifetime in milliseconds, 0 if already expired.
    pub fn remaining_lifetime_ms(&self) -> i64 {
        ((self.exp - Utc::now().timestamp()) * 1000).max(0)
    }
}

/// Why a token failed verification. All variants collapse to "invalid" for
/// authentication decisions; they are kept distinct for logging.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("unsupported token format")]
    Unsupported,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::Unsupported
            }
            _ => TokenError::Malformed,
        }
    }
}

/// Token codec: builds, signs and verifies session tokens.
///
/// Signing and verification are pure functions of the input plus the
/// immutable shared secret, so a single codec instance is safely shared
/// across requests.
#[derive(Clone)]
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl JwtCodec {
    /// Creates a codec from a signing secret and token lifetimes in
    /// milliseconds.
    pub fn new(secret: &[u8], access_lifetime_ms: u64, refresh_lifetime_ms: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // No clock leeway: a token past its expiry is invalid immediately.
        validation.leeway = 0;

        JwtCodec {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_lifetime: Duration::milliseconds(access_lifetime_ms as i64),
            refresh_lifetime: Duration::milliseconds(refresh_lifetime_ms as i64),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            config.jwt_expires_in_ms,
            config.jwt_refresh_expires_in_ms,
        )
    }

    pub fn access_lifetime(&self) -> Duration {
        self.access_lifetime
    }

    pub fn refresh_lifetime(&self) -> Duration {
        self.refresh_lifetime
    }

    /// Builds access-token claims for a verified user with their role names
    /// at issuance time.
    pub fn access_claims(&self, user: &User, roles: &[Role]) -> Claims {
        let now = Utc::now();
        Claims {
            sub: user.username.clone(),
            user_id: Some(user.id),
            email: Some(user.email.clone()),
            full_name: Some(user.full_name.clone()),
            roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
            iat: now.timestamp(),
            exp: (now + self.access_lifetime).timestamp(),
            token_type: None,
        }
    }

    /// Builds refresh-token claims: subject and kind marker only, no roles.
    pub fn refresh_claims(&self, username: &str) -> Claims {
        let now = Utc::now();
        Claims {
            sub: username.to_string(),
            user_id: None,
            email: None,
            full_name: None,
            roles: Vec::new(),
            iat: now.timestamp(),
            exp: (now + self.refresh_lifetime).timestamp(),
            token_type: Some(REFRESH_TOKEN_TYPE.to_string()),
        }
    }

    /// Signs a claims set into a compact token string.
    pub fn issue(&self, claims: &Claims) -> Result<String, ServiceError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| ServiceError::internal_error(format!("Token generation failed: {}", e)))
    }

    /// Verifies the signature and expiry of a token and returns its claims.
    ///
    /// Never panics on malformed input; the failure subtype is logged here
    /// and collapsed by callers into a single "invalid" outcome.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let err = TokenError::from(e);
                warn!(error = %err, "Token verification failed");
                err
            })
    }

    /// Decodes claims without checking signature or expiry.
    ///
    /// Callers must have called [`verify`](Self::verify) first on any
    /// trust-relevant path.
    pub fn decode_unverified(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.set_required_spec_claims::<&str>(&[]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::from)
    }
}
