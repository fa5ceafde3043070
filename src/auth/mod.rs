/*!
 * # Authentication Module
 *
 * Token issuance and verification for the storefront.
 *
 * - Access and refresh tokens are HMAC-signed JWTs carrying the user's email.
 *   Refresh tokens are marked with `type: "refresh"`.
 * - Clients send the access token in the `Token` header (an optional `Bearer `
 *   prefix is tolerated); `Authorization: Bearer` is accepted as a fallback.
 * - Logged-out refresh tokens are blacklisted in the shared cache until they
 *   could no longer have been valid anyway.
 */

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::cache::CacheBackend;
use crate::config::AppConfig;
use crate::errors::{ErrorResponse, ServiceError};

pub mod otp;
pub mod password_policy;
pub mod user;
pub mod validators;

pub use otp::{OtpCheck, OtpPurpose, OtpStore};

/// Header carrying the access token
pub const TOKEN_HEADER: &str = "token";

const REFRESH_TOKEN_TYPE: &str = "refresh";
const BLACKLIST_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Claim structure for JWT tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    /// Random token id so tokens minted in the same second differ
    #[serde(default)]
    pub jti: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl Claims {
    pub fn is_refresh(&self) -> bool {
        self.token_type.as_deref() == Some(REFRESH_TOKEN_TYPE)
    }
}

/// Authenticated user data extracted from the access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub email: String,
    pub token_id: String,
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub algorithm: Algorithm,
    pub access_token_expiration: Duration,
    pub refresh_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        algorithm: Algorithm,
        access_token_expiration: Duration,
        refresh_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            algorithm,
            access_token_expiration,
            refresh_token_expiration,
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            config.jwt_algorithm(),
            Duration::from_secs(config.jwt_expiration as u64),
            Duration::from_secs(config.refresh_token_expiration as u64),
        )
    }
}

/// Access/refresh pair handed out on login and signup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Authentication service that handles token issuance and validation
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    cache: Arc<dyn CacheBackend>,
}

impl AuthService {
    pub fn new(config: AuthConfig, cache: Arc<dyn CacheBackend>) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn sign(
        &self,
        email: &str,
        lifetime: Duration,
        token_type: Option<&str>,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(lifetime)
                .map_err(|_| AuthError::TokenCreation("Invalid token duration".to_string()))?;

        let claims = Claims {
            email: email.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.map(str::to_string),
        };

        encode(
            &Header::new(self.config.algorithm),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    pub fn generate_access_token(&self, email: &str) -> Result<String, AuthError> {
        self.sign(email, self.config.access_token_expiration, None)
    }

    pub fn generate_refresh_token(&self, email: &str) -> Result<String, AuthError> {
        self.sign(
            email,
            self.config.refresh_token_expiration,
            Some(REFRESH_TOKEN_TYPE),
        )
    }

    pub fn issue_token_pair(&self, email: &str) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.generate_access_token(email)?,
            refresh_token: self.generate_refresh_token(email)?,
            token_type: "Bearer".to_string(),
        })
    }

    /// Decodes and checks signature and expiry.
    pub fn decode_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::new(self.config.algorithm),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    /// Claims of a valid token, or `None` for anything unusable.
    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        match self.decode_token(token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!("Token rejected: {}", e);
                None
            }
        }
    }

    fn blacklist_key(token: &str) -> String {
        format!("blacklist_refresh_{}", token)
    }

    pub async fn blacklist_refresh_token(&self, token: &str) -> Result<(), AuthError> {
        self.cache
            .set(&Self::blacklist_key(token), "1", Some(BLACKLIST_TTL))
            .await
            .map_err(|e| AuthError::InternalError(e.to_string()))
    }

    pub async fn is_refresh_token_blacklisted(&self, token: &str) -> Result<bool, AuthError> {
        self.cache
            .exists(&Self::blacklist_key(token))
            .await
            .map_err(|e| AuthError::InternalError(e.to_string()))
    }

    /// Resolves the caller from request headers.
    pub fn authenticate_headers(&self, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
        let token = extract_token(headers).ok_or(AuthError::MissingToken)?;
        let claims = self.verify_token(&token).ok_or(AuthError::InvalidToken)?;
        if claims.is_refresh() {
            return Err(AuthError::InvalidToken);
        }
        Ok(AuthUser {
            email: claims.email,
            token_id: claims.jti,
        })
    }
}

fn strip_bearer(value: &str) -> &str {
    let value = value.trim();
    match value.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => value[7..].trim(),
        _ => value,
    }
}

/// Token from the `Token` header, else from `Authorization: Bearer`.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        let token = strip_bearer(value);
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| v.len() > 7 && v[..7].eq_ignore_ascii_case("bearer "))
        .map(|v| v[7..].trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing or invalid Authorization header")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid or expired token")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Authentication service not available")]
    ServiceUnavailable,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::TokenCreation(_) | Self::ServiceUnavailable | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::TokenExpired => {
                ServiceError::Unauthorized(err.to_string())
            }
            AuthError::TokenCreation(msg) => ServiceError::InternalError(msg),
            AuthError::ServiceUnavailable => ServiceError::InternalError(err.to_string()),
            AuthError::InternalError(msg) => ServiceError::InternalError(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "authentication failure");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            status: "error".to_string(),
            message,
            validation_errors: Vec::new(),
            request_id: crate::tracing::current_request_id().map(|id| id.0),
        };

        (status, Json(body)).into_response()
    }
}

/// Authentication middleware; expects `Arc<AuthService>` in the request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => return AuthError::ServiceUnavailable.into_response(),
    };

    match auth_service.authenticate_headers(request.headers()) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }
}
