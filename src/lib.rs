pub mod api;
pub mod auth;
pub mod cache;
pub mod calendar;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod state;

pub use cache::{DayIndicator, TaskCache};
pub use client::{HttpTaskApi, LocalTaskApi, TaskApi};
pub use config::AppConfig;
pub use error::AppError;
pub use session::Session;
pub use state::AppState;
