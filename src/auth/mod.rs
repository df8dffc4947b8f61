pub mod password;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::warn;

use crate::db::users;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

pub use password::{hash_password, verify_password};

/// Issues and validates opaque bearer credentials.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn issue(&self, user_id: &str) -> Result<String, AppError>;
    async fn resolve(&self, token: &str) -> Result<Option<User>, AppError>;
    async fn revoke(&self, token: &str) -> Result<(), AppError>;
}

pub struct SqliteAuthenticator {
    db: SqlitePool,
    ttl: Duration,
}

impl SqliteAuthenticator {
    pub fn new(db: SqlitePool, ttl: Duration) -> Self {
        Self { db, ttl }
    }
}

#[async_trait]
impl Authenticator for SqliteAuthenticator {
    async fn issue(&self, user_id: &str) -> Result<String, AppError> {
        let now = Utc::now();
        users::purge_expired_sessions(&self.db, now).await?;

        let token = new_token();
        users::insert_session(&self.db, &token, user_id, now, now + self.ttl).await?;
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<User>, AppError> {
        Ok(users::find_session_user(&self.db, token, Utc::now()).await?)
    }

    async fn revoke(&self, token: &str) -> Result<(), AppError> {
        users::delete_session(&self.db, token).await?;
        Ok(())
    }
}

fn new_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// The authenticated caller. Any failure to authenticate is reported as the
/// same `Unauthorized` error.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl AuthUser {
    pub fn owner_id(&self) -> &str {
        &self.user.id
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
        else {
            warn!("request without a usable bearer token: {}", parts.uri.path());
            return Err(AppError::Unauthorized);
        };

        match state.auth.resolve(token).await? {
            Some(user) => Ok(AuthUser {
                user,
                token: token.to_string(),
            }),
            None => {
                warn!("rejected unknown or expired token: {}", parts.uri.path());
                Err(AppError::Unauthorized)
            }
        }
    }
}
