use std::sync::Arc;

use chrono::Duration;
use sqlx::SqlitePool;

use crate::auth::{Authenticator, SqliteAuthenticator};
use crate::services::{AuthService, TaskService};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub auth: Arc<dyn Authenticator>,
}

impl AppState {
    pub fn new(db: SqlitePool, session_ttl: Duration) -> Self {
        let auth = Arc::new(SqliteAuthenticator::new(db.clone(), session_ttl));
        Self { db, auth }
    }

    pub fn tasks(&self) -> TaskService {
        TaskService::new(self.db.clone())
    }

    pub fn accounts(&self) -> AuthService {
        AuthService::new(self.db.clone(), self.auth.clone())
    }
}
