use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::cache::{DayIndicator, TaskCache};
use crate::calendar::{self, Week};
use crate::client::TaskApi;
use crate::error::AppError;
use crate::models::{NewTaskRequest, PublicUser, Task, UpdateTaskRequest};

/// One authenticated user's view of their tasks.
///
/// The session owns the only `TaskCache` for that user. Mutations go to the
/// remote API first and the cache is patched only with the confirmed result;
/// a failed call leaves the cache exactly as it was. Dropping the session
/// (see `logout`) discards the cache.
pub struct Session {
    user: PublicUser,
    api: Arc<dyn TaskApi>,
    cache: TaskCache,
    selected_date: NaiveDate,
    window: Option<(NaiveDate, NaiveDate)>,
}

impl Session {
    pub fn new(user: PublicUser, api: Arc<dyn TaskApi>) -> Self {
        Self::with_selected_date(user, api, Local::now().date_naive())
    }

    pub fn with_selected_date(
        user: PublicUser,
        api: Arc<dyn TaskApi>,
        selected: NaiveDate,
    ) -> Self {
        Self {
            user,
            api,
            cache: TaskCache::new(),
            selected_date: selected,
            window: None,
        }
    }

    pub fn user(&self) -> &PublicUser {
        &self.user
    }

    pub fn cache(&self) -> &TaskCache {
        &self.cache
    }

    /// The inclusive date range of the last successful fetch.
    pub fn window(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.window
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = date;
    }

    /// Loads the month containing the selected date.
    pub async fn fetch_month(&mut self) -> Result<(), AppError> {
        let (start, end) = calendar::month_bounds(self.selected_date);
        self.fetch_range(start, end).await
    }

    /// Replaces the cache with the tasks dated `start..=end`.
    pub async fn fetch_range(&mut self, start: NaiveDate, end: NaiveDate) -> Result<(), AppError> {
        let tasks = self.api.list_range(start, end).await.inspect_err(|e| {
            warn!("failed to load tasks {}..={}: {}", start, end, e);
        })?;
        debug!("loaded {} tasks for {}..={}", tasks.len(), start, end);
        self.cache.load(tasks);
        self.window = Some((start, end));
        Ok(())
    }

    pub async fn add_task(&mut self, req: NewTaskRequest) -> Result<Task, AppError> {
        let task = self.api.create(req).await.inspect_err(|e| {
            warn!("failed to add task: {}", e);
        })?;
        self.cache.upsert(task.clone());
        info!("added task {} on {}", task.id, task.date);
        Ok(task)
    }

    pub async fn update_task(
        &mut self,
        id: &str,
        req: UpdateTaskRequest,
    ) -> Result<Task, AppError> {
        let task = self.api.update(id, req).await.inspect_err(|e| {
            warn!("failed to update task {}: {}", id, e);
        })?;
        self.cache.upsert(task.clone());
        info!("updated task {}", task.id);
        Ok(task)
    }

    pub async fn delete_task(&mut self, id: &str) -> Result<(), AppError> {
        self.api.delete(id).await.inspect_err(|e| {
            warn!("failed to delete task {}: {}", id, e);
        })?;
        self.cache.remove(id);
        info!("deleted task {}", id);
        Ok(())
    }

    pub async fn toggle_task_completion(&mut self, id: &str) -> Result<Task, AppError> {
        let task = self.api.toggle(id).await.inspect_err(|e| {
            warn!("failed to toggle task {}: {}", id, e);
        })?;
        self.cache.upsert(task.clone());
        info!(
            "task {} {}",
            task.id,
            if task.completed { "completed" } else { "reopened" }
        );
        Ok(task)
    }

    pub fn tasks_for_date(&self, date: NaiveDate) -> Vec<Task> {
        self.cache.tasks_for_date(date)
    }

    pub fn tasks_for_selected_date(&self) -> Vec<Task> {
        self.cache.tasks_for_date(self.selected_date)
    }

    pub fn highest_priority_for_date(&self, date: NaiveDate) -> DayIndicator {
        self.cache.highest_priority_for_date(date)
    }

    /// Grid for the month containing the selected date.
    pub fn month_grid(&self, today: NaiveDate) -> Vec<Week> {
        calendar::month_grid(self.selected_date, &self.cache, self.selected_date, today)
    }

    /// Ends the session. The cache goes with it.
    pub fn logout(self) -> PublicUser {
        info!("session for {} closed", self.user.id);
        self.user
    }
}
