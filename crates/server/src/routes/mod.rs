use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{IntoMakeService, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{AppState, middleware::require_session};

pub mod assistant;
pub mod auth;
pub mod health;
pub mod modules;
pub mod notes;
pub mod projects;
pub mod tasks;
pub mod team;
pub mod team_chat;
pub mod uploads;
pub mod workspace_chat;

pub fn router(state: AppState) -> IntoMakeService<Router> {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::router());

    // Everything below requires a resolved identity; the auth middleware
    // injects the session and user extensions.
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .merge(projects::router(&state))
        .merge(modules::router(&state))
        .merge(tasks::router(&state))
        .merge(workspace_chat::router(&state))
        .merge(assistant::router())
        .merge(team::router())
        .merge(team_chat::router())
        .merge(notes::router(&state))
        .merge(uploads::router(&state))
        .layer(from_fn_with_state(state.clone(), require_session));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .into_make_service()
}
