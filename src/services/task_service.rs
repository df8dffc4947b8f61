use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{NewTaskRequest, Task, UpdateTaskRequest};

/// Owner-scoped task operations.
///
/// Every method takes the caller's owner id. A task that does not exist and
/// a task that belongs to another owner are indistinguishable: both are
/// `AppError::NotFound`.
#[derive(Clone)]
pub struct TaskService {
    db: SqlitePool,
}

impl TaskService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// All of the owner's tasks, by date ascending.
    pub async fn list_all(&self, owner_id: &str) -> Result<Vec<Task>, AppError> {
        Ok(repository::fetch_tasks(&self.db, owner_id).await?)
    }

    /// Tasks dated `start..=end`. The end bound is widened to the following
    /// day before querying, so a single-day range returns that day's tasks.
    pub async fn list_range(
        &self,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Task>, AppError> {
        if end < start {
            return Err(AppError::validation("end", "end date is before start date"));
        }
        let end_exclusive = end
            .succ_opt()
            .ok_or_else(|| AppError::validation("end", "end date is out of range"))?;

        Ok(repository::fetch_tasks_between(&self.db, owner_id, start, end_exclusive).await?)
    }

    pub async fn get(&self, owner_id: &str, id: &str) -> Result<Task, AppError> {
        repository::find_task(&self.db, owner_id, id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(&self, owner_id: &str, req: NewTaskRequest) -> Result<Task, AppError> {
        let draft = req.validate()?;
        let now = Utc::now();

        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            description: draft.description,
            date: draft.date,
            priority: draft.priority,
            completed: false,
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        repository::insert_task(&self.db, &task).await?;
        info!("created task {} on {} for {}", task.id, task.date, owner_id);
        Ok(task)
    }

    pub async fn update(
        &self,
        owner_id: &str,
        id: &str,
        req: UpdateTaskRequest,
    ) -> Result<Task, AppError> {
        let changes = req.validate()?;
        let mut task = self.get(owner_id, id).await?;

        changes.apply_to(&mut task);
        task.updated_at = Utc::now();

        if !repository::save_task(&self.db, &task).await? {
            return Err(AppError::NotFound);
        }
        info!("updated task {} for {}", task.id, owner_id);
        Ok(task)
    }

    pub async fn delete(&self, owner_id: &str, id: &str) -> Result<(), AppError> {
        if !repository::delete_task(&self.db, owner_id, id).await? {
            return Err(AppError::NotFound);
        }
        info!("deleted task {} for {}", id, owner_id);
        Ok(())
    }

    pub async fn toggle(&self, owner_id: &str, id: &str) -> Result<Task, AppError> {
        let task = repository::toggle_task(&self.db, owner_id, id)
            .await?
            .ok_or(AppError::NotFound)?;
        info!(
            "task {} marked {} for {}",
            task.id,
            if task.completed { "completed" } else { "open" },
            owner_id
        );
        Ok(task)
    }
}
