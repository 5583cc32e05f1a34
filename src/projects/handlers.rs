use axum::{
    extract::State,
    routing::{get, patch},
    Router,
};
use tracing::instrument;

use super::dto::{CreateProjectRequest, ProjectsQuery, UpdateProjectRequest};
use super::repo::Project;
use super::services;
use crate::{
    auth::AuthUser,
    error::AppResult,
    extract::{IdPath, ValidQuery, ValidatedJson},
    response::{ApiResponse, PageMeta},
    state::AppState,
};

pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/:project_id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/projects/:project_id/featured", patch(toggle_featured))
}

#[instrument(skip(state))]
pub async fn list_projects(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<ProjectsQuery>,
) -> AppResult<ApiResponse<Vec<Project>>> {
    let (projects, total) = services::list(&state.db, &q).await?;
    Ok(ApiResponse::ok(projects).with_pagination(PageMeta::with_total(&q.page(), total)))
}

#[instrument(skip(state))]
pub async fn get_project(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<ApiResponse<Project>> {
    Ok(ApiResponse::ok(services::get(&state.db, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_project(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateProjectRequest>,
) -> AppResult<ApiResponse<Project>> {
    let project = services::create(&state.db, ctx, payload).await?;
    Ok(ApiResponse::created(project).with_message("Project created successfully"))
}

#[instrument(skip(state, payload))]
pub async fn update_project(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    IdPath(id): IdPath,
    ValidatedJson(payload): ValidatedJson<UpdateProjectRequest>,
) -> AppResult<ApiResponse<Project>> {
    let project = services::update(&state.db, ctx, id, payload).await?;
    Ok(ApiResponse::ok(project).with_message("Project updated successfully"))
}

#[instrument(skip(state))]
pub async fn delete_project(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    IdPath(id): IdPath,
) -> AppResult<ApiResponse<()>> {
    services::delete(&state.db, ctx, id).await?;
    Ok(ApiResponse::message("Project deleted successfully"))
}

#[instrument(skip(state))]
pub async fn toggle_featured(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    IdPath(id): IdPath,
) -> AppResult<ApiResponse<Project>> {
    let project = services::toggle_featured(&state.db, ctx, id).await?;
    Ok(ApiResponse::ok(project))
}
