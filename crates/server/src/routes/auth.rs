use axum::{
    Extension, Json, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::post,
};
use db::models::{
    project::DEFAULT_PROJECT_ID,
    project_member::ProjectMember,
    session::Session,
    user::{User, UserPublic},
};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

const DEFAULT_ROLE: &str = "Developer";
const DEFAULT_AVATAR: &str = "👤";
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize, TS)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, serde::Serialize, TS)]
pub struct AuthResponse {
    pub token: Uuid,
    pub user: UserPublic,
}

pub async fn register(
    State(app): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<ResponseJson<ApiResponse<AuthResponse>>, ApiError> {
    let name = payload.name.trim();
    let email = payload.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".to_string()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to hash password: {e}")))?;

    let pool = &app.db().pool;
    let user = User::create(
        pool,
        Uuid::new_v4(),
        name,
        &email,
        &password_hash,
        payload.role.as_deref().unwrap_or(DEFAULT_ROLE),
        payload.avatar.as_deref().unwrap_or(DEFAULT_AVATAR),
    )
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ApiError::Conflict("Email is already registered".to_string())
        }
        _ => ApiError::Database(e),
    })?;

    // New accounts join the seeded workspace project immediately.
    ProjectMember::ensure(pool, user.id, DEFAULT_PROJECT_ID, "member").await?;

    let session = Session::create(pool, user.id).await?;
    tracing::info!("Registered user {} ({})", user.id, user.email);

    Ok(ResponseJson(ApiResponse::success(AuthResponse {
        token: session.token,
        user: user.public(),
    })))
}

pub async fn login(
    State(app): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<AuthResponse>>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    let pool = &app.db().pool;

    let user = User::find_by_email(pool, &email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let password_ok = bcrypt::verify(&payload.password, &user.password_hash).unwrap_or(false);
    if !password_ok {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    User::set_online(pool, user.id, true).await?;
    let session = Session::create(pool, user.id).await?;

    let mut user_public = user.public();
    user_public.online = true;

    Ok(ResponseJson(ApiResponse::success(AuthResponse {
        token: session.token,
        user: user_public,
    })))
}

pub async fn logout(
    Extension(session): Extension<Session>,
    Extension(user): Extension<User>,
    State(app): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &app.db().pool;
    Session::delete(pool, session.id).await?;
    User::set_online(pool, user.id, false).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}
