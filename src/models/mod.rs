pub mod task;
pub mod user;

pub use task::{
    DeleteResponse, NewTaskRequest, Priority, RangeQuery, Task, TaskChanges, TaskDraft,
    UpdateTaskRequest, format_day, parse_task_date,
};
pub use user::{AuthResponse, LoginRequest, PublicUser, RegisterRequest, User};
