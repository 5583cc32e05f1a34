use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::instrument;

use super::dto::{AuthResponse, ChangePasswordRequest, LoginRequest, MeResponse, RegisterRequest};
use super::extractors::AuthUser;
use super::services;
use crate::{error::AppResult, extract::ValidatedJson, response::ApiResponse, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(get_me))
        .route("/auth/change-password", post(change_password))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let res = services::register(&state.db, &state.jwt, payload).await?;
    Ok(ApiResponse::created(res).with_message("User registered successfully"))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let res = services::login(&state.db, &state.jwt, payload).await?;
    Ok(ApiResponse::ok(res).with_message("Login successful"))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> AppResult<ApiResponse<MeResponse>> {
    let me = services::me(&state.db, ctx).await?;
    Ok(ApiResponse::ok(me))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<ApiResponse<()>> {
    services::change_password(&state.db, ctx, payload).await?;
    Ok(ApiResponse::message("Password changed successfully"))
}
