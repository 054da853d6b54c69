use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{delete, get, put},
};
use chrono::{DateTime, Utc};
use db::models::{
    module::Module,
    task::{CreateTask, Task, TaskWithVerifier, UpdateTask},
    user::User,
};
use serde::Deserialize;
use services::services::progress;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::load_task_middleware};

#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    pub module_id: Uuid,
}

/// The completion trio moves in lockstep: marking a task done stamps the
/// verifying user and the timestamp; clearing it clears both.
fn completion_fields(
    existing: &Task,
    toggle: Option<bool>,
    verifier: Uuid,
    now: DateTime<Utc>,
) -> (bool, Option<Uuid>, Option<DateTime<Utc>>) {
    match toggle {
        Some(true) if !existing.completed => (true, Some(verifier), Some(now)),
        Some(false) => (false, None, None),
        _ => (
            existing.completed,
            existing.verified_by_id,
            existing.completed_at,
        ),
    }
}

pub async fn get_tasks(
    State(app): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskWithVerifier>>>, ApiError> {
    let pool = &app.db().pool;
    Module::find_by_id(pool, query.module_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Module not found".to_string()))?;

    let tasks = Task::find_by_module_id_with_verifier(pool, query.module_id).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn create_task(
    State(app): State<AppState>,
    Json(payload): Json<CreateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let description = payload.description.trim();
    if description.is_empty() {
        return Err(ApiError::BadRequest(
            "Task description is required".to_string(),
        ));
    }

    let pool = &app.db().pool;
    Module::find_by_id(pool, payload.module_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Module not found".to_string()))?;

    let task = Task::create(
        pool,
        payload.module_id,
        description,
        payload.category.as_deref().unwrap_or("General"),
        Uuid::new_v4(),
    )
    .await?;

    progress::recompute(pool, task.module_id).await?;

    tracing::debug!("Created task {} in module {}", task.id, task.module_id);
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task(
    Extension(existing_task): Extension<Task>,
    Extension(user): Extension<User>,
    State(app): State<AppState>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let description = match &payload.description {
        Some(d) if d.trim().is_empty() => {
            return Err(ApiError::BadRequest(
                "Task description is required".to_string(),
            ));
        }
        Some(d) => d.trim().to_string(),
        None => existing_task.description.clone(),
    };
    let category = payload
        .category
        .clone()
        .unwrap_or_else(|| existing_task.category.clone());

    let (completed, verified_by_id, completed_at) =
        completion_fields(&existing_task, payload.completed, user.id, Utc::now());

    let pool = &app.db().pool;
    let task = Task::update(
        pool,
        existing_task.id,
        &description,
        &category,
        completed,
        verified_by_id,
        completed_at,
    )
    .await?;

    progress::recompute(pool, task.module_id).await?;

    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    Extension(task): Extension<Task>,
    State(app): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &app.db().pool;
    let rows_affected = Task::delete(pool, task.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    progress::recompute(pool, task.module_id).await?;

    tracing::debug!("Deleted task {} from module {}", task.id, task.module_id);
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let task_id_router = Router::new()
        .route("/", get(get_task))
        .route("/", put(update_task))
        .route("/", delete(delete_task))
        .layer(from_fn_with_state(state.clone(), load_task_middleware));

    let inner = Router::new()
        .route("/", get(get_tasks).post(create_task))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/tasks", inner)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn task(completed: bool, verifier: Option<Uuid>) -> Task {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        Task {
            id: Uuid::from_u128(1),
            module_id: Uuid::from_u128(2),
            description: "Write parser".to_string(),
            category: "Backend".to_string(),
            completed,
            verified_by_id: verifier,
            completed_at: completed.then_some(at),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn completing_a_task_stamps_verifier_and_timestamp() {
        let verifier = Uuid::from_u128(9);
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();
        let (completed, verified_by, completed_at) =
            completion_fields(&task(false, None), Some(true), verifier, now);
        assert!(completed);
        assert_eq!(verified_by, Some(verifier));
        assert_eq!(completed_at, Some(now));
    }

    #[test]
    fn reopening_a_task_clears_verifier_and_timestamp() {
        let original_verifier = Uuid::from_u128(3);
        let now = Utc::now();
        let (completed, verified_by, completed_at) = completion_fields(
            &task(true, Some(original_verifier)),
            Some(false),
            Uuid::from_u128(9),
            now,
        );
        assert!(!completed);
        assert_eq!(verified_by, None);
        assert_eq!(completed_at, None);
    }

    #[test]
    fn re_completing_keeps_the_original_verifier() {
        let original_verifier = Uuid::from_u128(3);
        let existing = task(true, Some(original_verifier));
        let (completed, verified_by, completed_at) =
            completion_fields(&existing, Some(true), Uuid::from_u128(9), Utc::now());
        assert!(completed);
        assert_eq!(verified_by, Some(original_verifier));
        assert_eq!(completed_at, existing.completed_at);
    }

    #[test]
    fn no_toggle_leaves_completion_untouched() {
        let existing = task(false, None);
        let (completed, verified_by, completed_at) =
            completion_fields(&existing, None, Uuid::from_u128(9), Utc::now());
        assert!(!completed);
        assert_eq!(verified_by, None);
        assert_eq!(completed_at, None);
    }
}
