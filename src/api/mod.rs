mod extract;

use axum::Json;
use axum::extract::{Path, Query};
use axum::http::{HeaderValue, Method, header};
use axum::routing::{patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

pub use extract::JsonBody;

/// Router that accepts cross-origin calls from any origin.
pub fn router(state: AppState) -> Router {
    router_with_origins(state, &[])
}

pub fn router_with_origins(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/range", get(list_tasks_in_range))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/toggle", patch(toggle_task))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
}

/// An empty origin list allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let mut parsed = Vec::new();
    for origin in origins {
        match HeaderValue::from_str(origin) {
            Ok(value) => parsed.push(value),
            Err(err) => warn!("ignoring invalid CORS origin '{origin}': {err}"),
        }
    }
    layer.allow_origin(parsed)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let response = state.accounts().register(req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = state.accounts().login(req).await?;
    Ok(Json(response))
}

async fn me(caller: AuthUser) -> Json<PublicUser> {
    Json(caller.user.public())
}

async fn logout(State(state): State<AppState>, caller: AuthUser) -> Result<StatusCode, AppError> {
    state.accounts().logout(&caller.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tasks(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = state.tasks().list_all(caller.owner_id()).await?;
    Ok(Json(tasks))
}

async fn list_tasks_in_range(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(params): Query<RangeQuery>,
) -> Result<Json<Vec<Task>>, AppError> {
    let (Some(start), Some(end)) = (params.start, params.end) else {
        return Err(AppError::validation(
            "range",
            "Start and end dates are required",
        ));
    };
    let start = parse_task_date(&start).map_err(|_| {
        AppError::validation("start", format!("`{}` is not a valid date", start))
    })?;
    let end = parse_task_date(&end)
        .map_err(|_| AppError::validation("end", format!("`{}` is not a valid date", end)))?;

    let tasks = state
        .tasks()
        .list_range(caller.owner_id(), start, end)
        .await?;
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(req): JsonBody<NewTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = state.tasks().create(caller.owner_id(), req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let task = state.tasks().get(caller.owner_id(), &id).await?;
    Ok(Json(task))
}

async fn update_task(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    let task = state.tasks().update(caller.owner_id(), &id, req).await?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    state.tasks().delete(caller.owner_id(), &id).await?;
    Ok(Json(DeleteResponse {
        message: "Task deleted".to_string(),
    }))
}

async fn toggle_task(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let task = state.tasks().toggle(caller.owner_id(), &id).await?;
    Ok(Json(task))
}
