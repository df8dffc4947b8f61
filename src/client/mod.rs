pub mod http;
pub mod local;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::{NewTaskRequest, Task, UpdateTaskRequest};

pub use http::HttpTaskApi;
pub use local::LocalTaskApi;

/// Remote task operations as seen by one authenticated caller.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Task>, AppError>;
    /// Tasks dated `start..=end`.
    async fn list_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Task>, AppError>;
    async fn get(&self, id: &str) -> Result<Task, AppError>;
    async fn create(&self, req: NewTaskRequest) -> Result<Task, AppError>;
    async fn update(&self, id: &str, req: UpdateTaskRequest) -> Result<Task, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    async fn toggle(&self, id: &str) -> Result<Task, AppError>;
}
