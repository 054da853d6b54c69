use axum::{
    Extension, Json, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::user::{User, UserPublic};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize, TS)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub avatar: Option<String>,
}

pub async fn get_team(
    State(app): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<UserPublic>>>, ApiError> {
    let users = User::find_all_public(&app.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

/// Users edit only their own profile; the target is the resolved identity.
pub async fn update_profile(
    Extension(user): Extension<User>,
    State(app): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<ResponseJson<ApiResponse<UserPublic>>, ApiError> {
    if payload.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
    }

    let updated = User::update_profile(
        &app.db().pool,
        user.id,
        payload.name.as_deref().map(str::trim),
        payload.role.as_deref(),
        payload.avatar.as_deref(),
    )
    .await?;

    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/team", get(get_team))
        .route("/team/profile", put(update_profile))
}
