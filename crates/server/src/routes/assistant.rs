use axum::{Json, Router, extract::State, response::Json as ResponseJson, routing::post};
use serde::Deserialize;
use services::services::context::{self, ChatTurn};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, routes::workspace_chat::ChatResponse};

#[derive(Debug, Deserialize, TS)]
pub struct AssistantRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// General workspace assistant: a fixed instruction with the caller-supplied
/// turn history. Stateless; the client resubmits its running history on
/// every call and nothing is persisted here.
pub async fn send_assistant_turn(
    State(app): State<AppState>,
    Json(payload): Json<AssistantRequest>,
) -> Result<ResponseJson<ApiResponse<ChatResponse>>, ApiError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message is required".to_string()));
    }

    let turns = context::open_turns(&payload.history, message);
    let outcome = app
        .completion()
        .complete(context::general_instruction(), &turns)
        .await?;

    Ok(ResponseJson(ApiResponse::success(ChatResponse {
        message: outcome.text,
        usage: outcome.usage,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/assistant", post(send_assistant_turn))
}
