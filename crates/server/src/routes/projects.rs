use axum::{
    Extension, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    project::Project,
    project_member::{MemberWithUser, ProjectMember},
};
use serde::Serialize;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, middleware::load_project_middleware};

#[derive(Debug, Serialize, TS)]
pub struct ProjectWithMembers {
    #[serde(flatten)]
    #[ts(flatten)]
    pub project: Project,
    pub members: Vec<MemberWithUser>,
}

pub async fn get_projects(
    State(app): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Project>>>, ApiError> {
    let projects = Project::find_all(&app.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(projects)))
}

pub async fn get_project(
    Extension(project): Extension<Project>,
    State(app): State<AppState>,
) -> Result<ResponseJson<ApiResponse<ProjectWithMembers>>, ApiError> {
    let members =
        ProjectMember::find_by_project_id_with_users(&app.db().pool, project.id).await?;
    Ok(ResponseJson(ApiResponse::success(ProjectWithMembers {
        project,
        members,
    })))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let project_id_router = Router::new()
        .route("/", get(get_project))
        .layer(from_fn_with_state(state.clone(), load_project_middleware));

    let inner = Router::new()
        .route("/", get(get_projects))
        .nest("/{project_id}", project_id_router);

    Router::new().nest("/projects", inner)
}
