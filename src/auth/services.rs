use sqlx::PgPool;
use tracing::{info, warn};

use super::dto::{
    normalize_email, AuthResponse, ChangePasswordRequest, LoginRequest, MeResponse, RegisterRequest,
};
use super::extractors::AuthContext;
use super::jwt::JwtKeys;
use super::password::{hash_password, verify_password};
use super::repo::NewUser;
use super::repo_types::User;
use crate::db::StoreOutcome;
use crate::error::{AppError, AppResult};
use crate::portfolios::repo as portfolio_repo;
use crate::users::repo as user_repo;

/// Creates the user and its default portfolio in one transaction.
///
/// Username/email collisions are looked up first; a collision that still
/// slips through to the insert is reported the same way.
pub async fn register(db: &PgPool, keys: &JwtKeys, req: RegisterRequest) -> AppResult<AuthResponse> {
    let email = normalize_email(&req.email);
    let username = req.username.trim().to_string();
    let name = req.name.trim().to_string();

    match User::find_by_username_or_email(db, &username, &email).await {
        StoreOutcome::NotFound => {}
        StoreOutcome::Found(_) | StoreOutcome::Conflict { .. } => {
            warn!(%username, %email, "registration with taken username or email");
            return Err(AppError::DuplicateUser);
        }
        StoreOutcome::Failure(e) => return Err(e.into()),
    }

    let password_hash = hash_password(&req.password)?;

    let mut tx = db.begin().await.map_err(AppError::tx)?;

    let new = NewUser {
        name: &name,
        username: &username,
        email: &email,
        password_hash: &password_hash,
    };
    let user = match User::insert(&mut tx, &new).await {
        StoreOutcome::Found(user) => user,
        StoreOutcome::Conflict { constraint } => {
            warn!(?constraint, "duplicate user rejected by the database");
            return Err(AppError::DuplicateUser);
        }
        StoreOutcome::NotFound => return Err(AppError::tx("insert user returned no row")),
        StoreOutcome::Failure(e) => return Err(AppError::tx(e)),
    };

    match portfolio_repo::insert_default(&mut tx, user.id).await {
        StoreOutcome::Found(_) => {}
        StoreOutcome::NotFound => return Err(AppError::tx("insert portfolio returned no row")),
        StoreOutcome::Conflict { constraint } => {
            return Err(AppError::tx(format!("portfolio conflict on {constraint:?}")))
        }
        StoreOutcome::Failure(e) => return Err(AppError::tx(e)),
    }

    tx.commit().await.map_err(AppError::tx)?;

    let token = keys.issue(user.id)?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(AuthResponse {
        user: user.into(),
        token,
    })
}

pub async fn login(db: &PgPool, keys: &JwtKeys, req: LoginRequest) -> AppResult<AuthResponse> {
    let email = normalize_email(&req.email);

    let user = match User::find_by_email(db, &email).await {
        StoreOutcome::Found(user) => user,
        StoreOutcome::NotFound | StoreOutcome::Conflict { .. } => {
            warn!(%email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
        StoreOutcome::Failure(e) => return Err(e.into()),
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.issue(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse {
        user: user.into(),
        token,
    })
}

pub async fn me(db: &PgPool, ctx: AuthContext) -> AppResult<MeResponse> {
    let user = load_user(db, ctx).await?;
    let skills = user_repo::list_skills(db, ctx.user_id).await?;
    let social_links = user_repo::list_social_links(db, ctx.user_id).await?;
    Ok(MeResponse {
        user: user.into(),
        skills,
        social_links,
    })
}

pub async fn change_password(
    db: &PgPool,
    ctx: AuthContext,
    req: ChangePasswordRequest,
) -> AppResult<()> {
    let user = load_user(db, ctx).await?;

    if !verify_password(&req.current_password, &user.password_hash)? {
        warn!(user_id = %user.id, "change password with wrong current password");
        return Err(AppError::WrongPassword);
    }

    let hash = hash_password(&req.new_password)?;
    match User::update_password(db, user.id, &hash).await {
        StoreOutcome::Found(_) => {
            info!(user_id = %user.id, "password changed");
            Ok(())
        }
        StoreOutcome::NotFound | StoreOutcome::Conflict { .. } => {
            Err(AppError::not_found("User not found"))
        }
        StoreOutcome::Failure(e) => Err(e.into()),
    }
}

/// The token proves who the caller was; the row may be gone since.
async fn load_user(db: &PgPool, ctx: AuthContext) -> AppResult<User> {
    match User::find_by_id(db, ctx.user_id).await {
        StoreOutcome::Found(user) => Ok(user),
        StoreOutcome::NotFound | StoreOutcome::Conflict { .. } => {
            Err(AppError::not_found("User not found"))
        }
        StoreOutcome::Failure(e) => Err(e.into()),
    }
}
