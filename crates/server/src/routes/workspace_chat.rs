use axum::{
    Extension, Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    module::Module, project::Project, task::Task, user::User, workspace_chat::WorkspaceChat,
};
use serde::{Deserialize, Serialize};
use services::services::{
    completion::Usage,
    context::{self, ChatTurn},
};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, middleware::load_module_middleware};

/// History rows returned to the workspace page per module.
const HISTORY_FETCH_LIMIT: i64 = 50;

#[derive(Debug, Deserialize, TS)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, TS)]
pub struct ChatResponse {
    pub message: String,
    pub usage: Usage,
}

pub async fn get_chat_history(
    Extension(module): Extension<Module>,
    Extension(user): Extension<User>,
    State(app): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<WorkspaceChat>>>, ApiError> {
    let messages =
        WorkspaceChat::find_recent(&app.db().pool, module.id, user.id, HISTORY_FETCH_LIMIT)
            .await?;
    Ok(ResponseJson(ApiResponse::success(messages)))
}

/// One module-scoped assistant turn: build the deterministic module context,
/// call the completion service, then persist both sides of the exchange.
/// Nothing is stored when the upstream call fails, so history never holds a
/// user turn without its reply.
pub async fn send_chat_turn(
    Extension(module): Extension<Module>,
    Extension(user): Extension<User>,
    State(app): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<ResponseJson<ApiResponse<ChatResponse>>, ApiError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message is required".to_string()));
    }

    let pool = &app.db().pool;
    let project = Project::find_by_id(pool, module.project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    let tasks = Task::find_by_module_id(pool, module.id).await?;

    let instruction = context::module_instruction(&project, &module, &tasks);
    let turns = context::bounded_turns(&payload.history, message);

    let outcome = app.completion().complete(&instruction, &turns).await?;

    WorkspaceChat::record_exchange(pool, module.id, user.id, message, &outcome.text).await?;

    tracing::debug!(
        "Assistant answered for module {} ({} output tokens)",
        module.id,
        outcome.usage.output_tokens
    );

    Ok(ResponseJson(ApiResponse::success(ChatResponse {
        message: outcome.text,
        usage: outcome.usage,
    })))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let chat_router = Router::new()
        .route("/", get(get_chat_history).post(send_chat_turn))
        .layer(from_fn_with_state(state.clone(), load_module_middleware));

    Router::new().nest("/modules/{module_id}/chat", chat_router)
}
