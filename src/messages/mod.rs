use crate::state::AppState;
use axum::Router;

pub mod dto;
mod handlers;
pub mod repo;
mod services;

pub fn router() -> Router<AppState> {
    handlers::message_routes()
}
