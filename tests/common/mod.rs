#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use sqlx::SqlitePool;
use taskcal::db;
use taskcal::models::{PublicUser, RegisterRequest};
use taskcal::state::AppState;

pub async fn test_pool() -> SqlitePool {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create database");
    db::migrate(&pool).await.expect("Failed to run migrations");
    pool
}

pub fn test_state(pool: SqlitePool) -> AppState {
    AppState::new(pool, Duration::hours(1))
}

/// Registers a user and returns it together with a bearer token.
pub async fn register_user(state: &AppState, email: &str) -> (PublicUser, String) {
    let response = state
        .accounts()
        .register(RegisterRequest {
            name: "Test User".to_string(),
            email: email.to_string(),
            password: "secret-password".to_string(),
        })
        .await
        .expect("Failed to register user");
    (response.user, response.token)
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
