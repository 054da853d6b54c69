use axum::{
    Extension, Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::models::{note::Note, user::User};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, middleware::load_note_middleware};

#[derive(Debug, Deserialize, TS)]
pub struct CreateNoteRequest {
    pub text: String,
}

pub async fn get_notes(
    Extension(user): Extension<User>,
    State(app): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Note>>>, ApiError> {
    let notes = Note::find_by_user_id(&app.db().pool, user.id).await?;
    Ok(ResponseJson(ApiResponse::success(notes)))
}

pub async fn create_note(
    Extension(user): Extension<User>,
    State(app): State<AppState>,
    Json(payload): Json<CreateNoteRequest>,
) -> Result<ResponseJson<ApiResponse<Note>>, ApiError> {
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Text is required".to_string()));
    }

    let note = Note::create(&app.db().pool, user.id, text).await?;
    Ok(ResponseJson(ApiResponse::success(note)))
}

pub async fn delete_note(
    Extension(note): Extension<Note>,
    Extension(user): Extension<User>,
    State(app): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    // Ownership check; a foreign note id reads as absent rather than
    // revealing that it exists.
    if note.user_id != user.id {
        return Err(ApiError::NotFound("Note not found".to_string()));
    }

    Note::delete(&app.db().pool, note.id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let note_id_router = Router::new()
        .route("/", delete(delete_note))
        .layer(from_fn_with_state(state.clone(), load_note_middleware));

    let inner = Router::new()
        .route("/", get(get_notes).post(create_note))
        .nest("/{note_id}", note_id_router);

    Router::new().nest("/notes", inner)
}
