use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::User;

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";

pub async fn insert_user(db: &SqlitePool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.created_at)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn find_user_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
    sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(db)
        .await
}

pub async fn insert_session(
    db: &SqlitePool,
    token: &str,
    user_id: &str,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(token)
    .bind(user_id)
    .bind(created_at)
    .bind(expires_at.timestamp())
    .execute(db)
    .await?;

    Ok(())
}

/// Resolves a session token to its user, ignoring sessions that expired
/// before `now`.
pub async fn find_session_user(
    db: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.name, u.email, u.password_hash, u.created_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = ?1 AND s.expires_at > ?2
        "#,
    )
    .bind(token)
    .bind(now.timestamp())
    .fetch_optional(db)
    .await
}

pub async fn delete_session(db: &SqlitePool, token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = ?1")
        .bind(token)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn purge_expired_sessions(
    db: &SqlitePool,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
        .bind(now.timestamp())
        .execute(db)
        .await?
        .rows_affected();

    Ok(result)
}
