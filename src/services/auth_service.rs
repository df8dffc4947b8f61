use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{Authenticator, hash_password, verify_password};
use crate::db::users;
use crate::error::AppError;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User};

const MIN_PASSWORD_LEN: usize = 6;

pub struct AuthService {
    db: SqlitePool,
    auth: Arc<dyn Authenticator>,
}

impl AuthService {
    pub fn new(db: SqlitePool, auth: Arc<dyn Authenticator>) -> Self {
        Self { db, auth }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, AppError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name", "name is required"));
        }
        let email = normalize_email(&req.email);
        if !email.contains('@') {
            return Err(AppError::validation("email", "email is invalid"));
        }
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(
                "password",
                format!("password must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }

        if users::find_user_by_email(&self.db, &email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email,
            password_hash: hash_password(&req.password),
            created_at: Utc::now(),
        };

        match users::insert_user(&self.db, &user).await {
            Ok(()) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AppError::Conflict("User already exists".to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        info!("registered user {}", user.id);

        let token = self.auth.issue(&user.id).await?;
        Ok(AuthResponse {
            token,
            user: user.public(),
        })
    }

    /// Unknown email and wrong password are the same failure.
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AppError> {
        let email = normalize_email(&req.email);
        let user = match users::find_user_by_email(&self.db, &email).await? {
            Some(user) if verify_password(&req.password, &user.password_hash) => user,
            _ => {
                warn!("failed login attempt");
                return Err(AppError::Unauthorized);
            }
        };

        let token = self.auth.issue(&user.id).await?;
        info!("user {} logged in", user.id);
        Ok(AuthResponse {
            token,
            user: user.public(),
        })
    }

    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.auth.revoke(token).await
    }
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
