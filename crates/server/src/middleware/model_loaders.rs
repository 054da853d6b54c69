use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use db::models::{module::Module, note::Note, project::Project, task::Task, upload::Upload};
use uuid::Uuid;

use crate::AppState;

pub async fn load_project_middleware(
    State(app): State<AppState>,
    Path(project_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let project = match Project::find_by_id(&app.db().pool, project_id).await {
        Ok(Some(project)) => project,
        Ok(None) => {
            tracing::warn!("Project {} not found", project_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(e) => {
            tracing::error!("Failed to fetch project {}: {}", project_id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    request.extensions_mut().insert(project);
    Ok(next.run(request).await)
}

pub async fn load_module_middleware(
    State(app): State<AppState>,
    Path(module_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let module = match Module::find_by_id(&app.db().pool, module_id).await {
        Ok(Some(module)) => module,
        Ok(None) => {
            tracing::warn!("Module {} not found", module_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(e) => {
            tracing::error!("Failed to fetch module {}: {}", module_id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    request.extensions_mut().insert(module);
    Ok(next.run(request).await)
}

pub async fn load_task_middleware(
    State(app): State<AppState>,
    Path(task_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let task = match Task::find_by_id(&app.db().pool, task_id).await {
        Ok(Some(task)) => task,
        Ok(None) => {
            tracing::warn!("Task {} not found", task_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(e) => {
            tracing::error!("Failed to fetch task {}: {}", task_id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    request.extensions_mut().insert(task);
    Ok(next.run(request).await)
}

pub async fn load_note_middleware(
    State(app): State<AppState>,
    Path(note_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let note = match Note::find_by_id(&app.db().pool, note_id).await {
        Ok(Some(note)) => note,
        Ok(None) => {
            tracing::warn!("Note {} not found", note_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(e) => {
            tracing::error!("Failed to fetch note {}: {}", note_id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    request.extensions_mut().insert(note);
    Ok(next.run(request).await)
}

pub async fn load_upload_middleware(
    State(app): State<AppState>,
    Path(upload_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let upload = match Upload::find_by_id(&app.db().pool, upload_id).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            tracing::warn!("Upload {} not found", upload_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(e) => {
            tracing::error!("Failed to fetch upload {}: {}", upload_id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    request.extensions_mut().insert(upload);
    Ok(next.run(request).await)
}
