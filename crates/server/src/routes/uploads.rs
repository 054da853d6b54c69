use axum::{
    Extension, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{delete, get},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use db::models::{
    project::{DEFAULT_PROJECT_ID, Project},
    upload::{Upload, UploadMeta},
    user::User,
};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::load_upload_middleware};

const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub project_id: Option<Uuid>,
}

pub async fn get_uploads(
    State(app): State<AppState>,
    Query(query): Query<UploadQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<UploadMeta>>>, ApiError> {
    let project_id = query.project_id.unwrap_or(DEFAULT_PROJECT_ID);
    let uploads = Upload::find_meta_by_project_id(&app.db().pool, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(uploads)))
}

/// Full record, including the base64 content blob.
pub async fn get_upload(
    Extension(upload): Extension<Upload>,
) -> Result<ResponseJson<ApiResponse<Upload>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(upload)))
}

pub async fn create_upload(
    Extension(user): Extension<User>,
    State(app): State<AppState>,
    mut multipart: Multipart,
) -> Result<ResponseJson<ApiResponse<UploadMeta>>, ApiError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut project_id = DEFAULT_PROJECT_ID;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .unwrap_or("upload")
                    .to_string();
                let file_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {e}")))?;
                file = Some((filename, file_type, bytes.to_vec()));
            }
            Some("project_id") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {e}")))?;
                project_id = raw
                    .parse()
                    .map_err(|_| ApiError::BadRequest("Invalid project id".to_string()))?;
            }
            _ => {}
        }
    }

    let (filename, file_type, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;

    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::BadRequest(
            "File too large. Maximum size is 5MB".to_string(),
        ));
    }

    let pool = &app.db().pool;
    Project::find_by_id(pool, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let content = BASE64.encode(&bytes);
    let upload = Upload::create(
        pool,
        project_id,
        user.id,
        &filename,
        &file_type,
        bytes.len() as i64,
        &content,
    )
    .await?;

    Ok(ResponseJson(ApiResponse::success(
        upload.meta(user.brief()),
    )))
}

pub async fn delete_upload(
    Extension(upload): Extension<Upload>,
    State(app): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    Upload::delete(&app.db().pool, upload.id).await?;
    tracing::debug!("Deleted upload {} ({})", upload.id, upload.filename);
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let upload_id_router = Router::new()
        .route("/", get(get_upload))
        .route("/", delete(delete_upload))
        .layer(from_fn_with_state(state.clone(), load_upload_middleware));

    let inner = Router::new()
        .route("/", get(get_uploads).post(create_upload))
        // Content is base64-encoded into the row; allow headroom above the
        // 5MB raw cap for multipart framing.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 1024 * 1024))
        .nest("/{upload_id}", upload_id_router);

    Router::new().nest("/uploads", inner)
}
