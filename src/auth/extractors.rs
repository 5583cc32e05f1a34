use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderValue},
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{JwtKeys, TokenError};
use crate::error::AppError;

/// Identity resolved from a verified bearer token. Handed to handlers and
/// services by value; the user row itself is not loaded here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Required,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    MissingToken,
    BadScheme,
    Token(TokenError),
}

impl From<AuthRejection> for AppError {
    fn from(r: AuthRejection) -> Self {
        let msg = match r {
            AuthRejection::MissingToken => "Access token required",
            AuthRejection::BadScheme => "Invalid authorization header",
            AuthRejection::Token(TokenError::Expired) => "Token expired",
            AuthRejection::Token(_) => "Invalid token",
        };
        AppError::unauthorized(msg)
    }
}

/// `NoToken -> TokenPresent -> Authenticated | Rejected`.
///
/// A missing header is only an error in `Required` mode. A header that is
/// present but unusable is rejected in both modes.
pub fn resolve_identity(
    header: Option<&HeaderValue>,
    keys: &JwtKeys,
    mode: AuthMode,
) -> Result<Option<AuthContext>, AuthRejection> {
    let Some(header) = header else {
        return match mode {
            AuthMode::Required => Err(AuthRejection::MissingToken),
            AuthMode::Optional => Ok(None),
        };
    };

    let raw = header.to_str().map_err(|_| AuthRejection::BadScheme)?;
    let token = raw
        .strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .map(str::trim)
        .ok_or(AuthRejection::BadScheme)?;

    let user_id = keys.verify(token).map_err(|e| {
        warn!(error = %e, "rejected bearer token");
        AuthRejection::Token(e)
    })?;

    Ok(Some(AuthContext { user_id }))
}

/// Protected routes.
pub struct AuthUser(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        match resolve_identity(parts.headers.get(AUTHORIZATION), &keys, AuthMode::Required)? {
            Some(ctx) => Ok(AuthUser(ctx)),
            None => Err(AuthRejection::MissingToken.into()),
        }
    }
}

/// Public routes that personalise the response when a caller is known.
pub struct OptionalAuthUser(pub Option<AuthContext>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let ctx = resolve_identity(parts.headers.get(AUTHORIZATION), &keys, AuthMode::Optional)?;
        Ok(OptionalAuthUser(ctx))
    }
}
