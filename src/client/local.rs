use async_trait::async_trait;
use chrono::NaiveDate;

use crate::client::TaskApi;
use crate::error::AppError;
use crate::models::{NewTaskRequest, Task, UpdateTaskRequest};
use crate::services::TaskService;

/// In-process `TaskApi` that calls the task service directly, bypassing HTTP.
pub struct LocalTaskApi {
    service: TaskService,
    owner_id: String,
}

impl LocalTaskApi {
    pub fn new(service: TaskService, owner_id: impl Into<String>) -> Self {
        Self {
            service,
            owner_id: owner_id.into(),
        }
    }
}

#[async_trait]
impl TaskApi for LocalTaskApi {
    async fn list_all(&self) -> Result<Vec<Task>, AppError> {
        self.service.list_all(&self.owner_id).await
    }

    async fn list_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Task>, AppError> {
        self.service.list_range(&self.owner_id, start, end).await
    }

    async fn get(&self, id: &str) -> Result<Task, AppError> {
        self.service.get(&self.owner_id, id).await
    }

    async fn create(&self, req: NewTaskRequest) -> Result<Task, AppError> {
        self.service.create(&self.owner_id, req).await
    }

    async fn update(&self, id: &str, req: UpdateTaskRequest) -> Result<Task, AppError> {
        self.service.update(&self.owner_id, id, req).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.service.delete(&self.owner_id, id).await
    }

    async fn toggle(&self, id: &str) -> Result<Task, AppError> {
        self.service.toggle(&self.owner_id, id).await
    }
}
