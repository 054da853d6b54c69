use axum::{
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use db::models::{session::Session, user::User};
use uuid::Uuid;

use crate::AppState;

/// Resolves the bearer session token to a [`User`] and injects both the
/// session and the user as request extensions. Handlers receive identity as
/// an explicit value; nothing reads it from ambient state.
pub async fn require_session(
    State(app): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let session = match Session::find_valid_by_token(&app.db().pool, token).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            tracing::warn!("Rejected unknown or expired session token");
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(e) => {
            tracing::error!("Failed to resolve session: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let user = match User::find_by_id(&app.db().pool, session.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!("Session {} references a missing user", session.id);
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(e) => {
            tracing::error!("Failed to fetch user {}: {}", session.user_id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    request.extensions_mut().insert(session);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
