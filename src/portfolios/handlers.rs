use axum::{
    extract::State,
    routing::{get, put},
    Router,
};
use tracing::instrument;

use super::dto::{PortfolioResponse, UpdatePortfolioRequest};
use super::services;
use crate::{
    auth::{AuthUser, OptionalAuthUser},
    error::AppResult,
    extract::{IdPath, ValidatedJson},
    response::ApiResponse,
    state::AppState,
};

pub fn portfolio_routes() -> Router<AppState> {
    Router::new()
        .route("/portfolios", put(update_portfolio))
        .route("/portfolios/:user_id", get(get_portfolio))
}

#[instrument(skip(state))]
pub async fn get_portfolio(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    IdPath(user_id): IdPath,
) -> AppResult<ApiResponse<PortfolioResponse>> {
    let portfolio = services::get(&state.db, user_id, viewer).await?;
    Ok(ApiResponse::ok(portfolio))
}

#[instrument(skip(state, payload))]
pub async fn update_portfolio(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdatePortfolioRequest>,
) -> AppResult<ApiResponse<PortfolioResponse>> {
    let portfolio = services::update(&state.db, ctx, payload).await?;
    Ok(ApiResponse::ok(portfolio).with_message("Portfolio updated successfully"))
}
