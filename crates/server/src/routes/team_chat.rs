use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    chat_message::{ChatMessage, ChatMessageWithUser},
    project::{DEFAULT_PROJECT_ID, Project},
    user::User,
};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Most recent messages returned per project, oldest first.
const MESSAGE_FETCH_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct TeamChatQuery {
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, TS)]
pub struct SendMessageRequest {
    pub project_id: Option<Uuid>,
    pub message: String,
}

pub async fn get_messages(
    State(app): State<AppState>,
    Query(query): Query<TeamChatQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<ChatMessageWithUser>>>, ApiError> {
    let project_id = query.project_id.unwrap_or(DEFAULT_PROJECT_ID);
    let messages =
        ChatMessage::find_recent_by_project(&app.db().pool, project_id, MESSAGE_FETCH_LIMIT)
            .await?;
    Ok(ResponseJson(ApiResponse::success(messages)))
}

pub async fn send_message(
    Extension(user): Extension<User>,
    State(app): State<AppState>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<ResponseJson<ApiResponse<ChatMessageWithUser>>, ApiError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message is required".to_string()));
    }

    let pool = &app.db().pool;
    let project_id = payload.project_id.unwrap_or(DEFAULT_PROJECT_ID);
    Project::find_by_id(pool, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let created = ChatMessage::create(pool, project_id, user.id, message).await?;
    Ok(ResponseJson(ApiResponse::success(ChatMessageWithUser {
        message: created,
        user: user.brief(),
    })))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/team-chat", get(get_messages).post(send_message))
}
