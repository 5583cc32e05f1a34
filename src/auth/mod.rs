use crate::state::AppState;
use axum::Router;

mod claims;
pub mod dto;
pub mod extractors;
mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
mod services;

pub use extractors::{AuthContext, AuthUser, OptionalAuthUser};

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
