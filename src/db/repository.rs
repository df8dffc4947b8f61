use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::models::{Priority, Task};

const TASK_COLUMNS: &str =
    "id, title, description, date, priority, completed, owner_id, created_at, updated_at";

#[derive(Debug, FromRow)]
struct TaskRow {
    id: String,
    title: String,
    description: Option<String>,
    date: NaiveDate,
    priority: String,
    completed: bool,
    owner_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = sqlx::Error;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let priority = row
            .priority
            .parse::<Priority>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Task {
            id: row.id,
            title: row.title,
            description: row.description,
            date: row.date,
            priority,
            completed: row.completed,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_tasks(rows: Vec<TaskRow>) -> Result<Vec<Task>, sqlx::Error> {
    rows.into_iter().map(Task::try_from).collect()
}

pub async fn fetch_tasks(db: &SqlitePool, owner_id: &str) -> Result<Vec<Task>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM tasks WHERE owner_id = ? ORDER BY date ASC, created_at ASC",
        TASK_COLUMNS
    );
    let rows = sqlx::query_as::<_, TaskRow>(&sql)
        .bind(owner_id)
        .fetch_all(db)
        .await?;
    into_tasks(rows)
}

/// Tasks with `start <= date < end_exclusive`.
pub async fn fetch_tasks_between(
    db: &SqlitePool,
    owner_id: &str,
    start: NaiveDate,
    end_exclusive: NaiveDate,
) -> Result<Vec<Task>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM tasks WHERE owner_id = ? AND date >= ? AND date < ? ORDER BY date ASC, created_at ASC",
        TASK_COLUMNS
    );
    let rows = sqlx::query_as::<_, TaskRow>(&sql)
        .bind(owner_id)
        .bind(start)
        .bind(end_exclusive)
        .fetch_all(db)
        .await?;
    into_tasks(rows)
}

pub async fn find_task(
    db: &SqlitePool,
    owner_id: &str,
    id: &str,
) -> Result<Option<Task>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM tasks WHERE id = ? AND owner_id = ?",
        TASK_COLUMNS
    );
    sqlx::query_as::<_, TaskRow>(&sql)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(db)
        .await?
        .map(Task::try_from)
        .transpose()
}

pub async fn insert_task(db: &SqlitePool, task: &Task) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO tasks
            (id, title, description, date, priority, completed, owner_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&task.id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.date)
    .bind(task.priority.as_str())
    .bind(task.completed)
    .bind(&task.owner_id)
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(db)
    .await?;

    Ok(())
}

/// Writes every mutable column of `task`. Returns false when no row owned
/// by `task.owner_id` has that id.
pub async fn save_task(db: &SqlitePool, task: &Task) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE tasks
        SET title = ?1,
            description = ?2,
            date = ?3,
            priority = ?4,
            completed = ?5,
            updated_at = ?6
        WHERE id = ?7 AND owner_id = ?8
        "#,
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.date)
    .bind(task.priority.as_str())
    .bind(task.completed)
    .bind(task.updated_at)
    .bind(&task.id)
    .bind(&task.owner_id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn toggle_task(
    db: &SqlitePool,
    owner_id: &str,
    id: &str,
) -> Result<Option<Task>, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        UPDATE tasks
        SET completed = NOT completed,
            updated_at = ?1
        WHERE id = ?2 AND owner_id = ?3
        "#,
    )
    .bind(now)
    .bind(id)
    .bind(owner_id)
    .execute(db)
    .await?
    .rows_affected();

    if result == 0 {
        return Ok(None);
    }
    find_task(db, owner_id, id).await
}

pub async fn delete_task(db: &SqlitePool, owner_id: &str, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?1 AND owner_id = ?2")
        .bind(id)
        .bind(owner_id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
