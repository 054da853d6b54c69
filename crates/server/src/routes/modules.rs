use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{delete, get, put},
};
use db::models::{
    module::{CreateModule, Module, ModuleWithDetails, UpdateModule},
    project::Project,
    task::Task,
    user::User,
};
use serde::Deserialize;
use services::services::progress;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::load_module_middleware};

#[derive(Debug, Deserialize)]
pub struct ModuleQuery {
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub assigned: bool,
}

pub async fn get_modules(
    Extension(user): Extension<User>,
    State(app): State<AppState>,
    Query(query): Query<ModuleQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<ModuleWithDetails>>>, ApiError> {
    let assignee_id = query.assigned.then_some(user.id);
    let modules = Module::find_filtered(&app.db().pool, query.project_id, assignee_id).await?;
    let detailed = ModuleWithDetails::load(&app.db().pool, modules).await?;
    Ok(ResponseJson(ApiResponse::success(detailed)))
}

pub async fn create_module(
    State(app): State<AppState>,
    Json(payload): Json<CreateModule>,
) -> Result<ResponseJson<ApiResponse<ModuleWithDetails>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Module name is required".to_string()));
    }
    for task in &payload.tasks {
        if task.description.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Task description is required".to_string(),
            ));
        }
    }

    let pool = &app.db().pool;
    Project::find_by_id(pool, payload.project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let module_id = Uuid::new_v4();
    let mut tx = pool.begin().await?;
    let module = Module::create(&mut *tx, &payload, module_id).await?;
    for task in &payload.tasks {
        Task::create(
            &mut *tx,
            module.id,
            task.description.trim(),
            task.category.as_deref().unwrap_or("General"),
            Uuid::new_v4(),
        )
        .await?;
    }
    tx.commit().await?;

    // Initial tasks count toward progress from the start.
    let module = progress::recompute(pool, module.id).await?;

    tracing::info!("Created module {} ({})", module.id, module.name);

    let detailed = ModuleWithDetails::load(pool, vec![module])
        .await?
        .pop()
        .ok_or_else(|| ApiError::NotFound("Module not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(detailed)))
}

pub async fn get_module(
    Extension(module): Extension<Module>,
    State(app): State<AppState>,
) -> Result<ResponseJson<ApiResponse<ModuleWithDetails>>, ApiError> {
    let detailed = ModuleWithDetails::load(&app.db().pool, vec![module])
        .await?
        .pop()
        .ok_or_else(|| ApiError::NotFound("Module not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(detailed)))
}

/// Administrative edit path. Status set here (including `review`) is a
/// manual override and is not recomputed; the next task mutation will
/// re-derive progress over it.
pub async fn update_module(
    Extension(module): Extension<Module>,
    State(app): State<AppState>,
    Json(payload): Json<UpdateModule>,
) -> Result<ResponseJson<ApiResponse<Module>>, ApiError> {
    if payload.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(ApiError::BadRequest("Module name is required".to_string()));
    }

    let updated = Module::update(&app.db().pool, module.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub async fn delete_module(
    Extension(module): Extension<Module>,
    State(app): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Module::delete(&app.db().pool, module.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Module not found".to_string()));
    }
    tracing::info!("Deleted module {} ({})", module.id, module.name);
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let module_id_router = Router::new()
        .route("/", get(get_module))
        .route("/", put(update_module))
        .route("/", delete(delete_module))
        .layer(from_fn_with_state(state.clone(), load_module_middleware));

    let inner = Router::new()
        .route("/", get(get_modules).post(create_module))
        .nest("/{module_id}", module_id_router);

    Router::new().nest("/modules", inner)
}
