use axum::{
    extract::State,
    routing::{delete, get, put},
    Router,
};
use tracing::instrument;

use super::dto::{
    ProfileResponse, UpdateProfileRequest, UpdateSkillsRequest, UpdateSocialLinksRequest,
    UsersQuery,
};
use super::repo::{SocialLink, UserProfile};
use super::services;
use crate::{
    auth::{repo_types::PublicUser, AuthUser, OptionalAuthUser},
    error::AppResult,
    extract::{IdPath, ValidQuery, ValidatedJson},
    response::{ApiResponse, PageMeta},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/profile", put(update_profile))
        .route("/users/skills", put(update_skills))
        .route("/users/social-links", put(update_social_links))
        .route("/users/account", delete(delete_account))
        .route("/users/:user_id", get(get_user))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<UsersQuery>,
) -> AppResult<ApiResponse<Vec<UserProfile>>> {
    let page = q.page();
    let (users, total) = services::list(&state.db, q.search.as_deref(), &page).await?;
    Ok(ApiResponse::ok(users).with_pagination(PageMeta::with_total(&page, total)))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    IdPath(user_id): IdPath,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let profile = services::profile(&state.db, user_id, viewer).await?;
    Ok(ApiResponse::ok(profile))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<ApiResponse<PublicUser>> {
    let user = services::update_profile(&state.db, ctx, payload).await?;
    Ok(ApiResponse::ok(user).with_message("Profile updated successfully"))
}

#[instrument(skip(state, payload))]
pub async fn update_skills(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateSkillsRequest>,
) -> AppResult<ApiResponse<Vec<String>>> {
    let skills = services::replace_skills(&state.db, ctx, payload).await?;
    Ok(ApiResponse::ok(skills).with_message("Skills updated successfully"))
}

#[instrument(skip(state, payload))]
pub async fn update_social_links(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateSocialLinksRequest>,
) -> AppResult<ApiResponse<Vec<SocialLink>>> {
    let links = services::replace_social_links(&state.db, ctx, payload).await?;
    Ok(ApiResponse::ok(links).with_message("Social links updated successfully"))
}

#[instrument(skip(state))]
pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> AppResult<ApiResponse<()>> {
    services::delete_account(&state.db, ctx).await?;
    Ok(ApiResponse::message("Account deleted successfully"))
}
