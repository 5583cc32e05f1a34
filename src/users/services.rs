use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::dto::{
    normalize_skills, ProfileResponse, UpdateProfileRequest, UpdateSkillsRequest,
    UpdateSocialLinksRequest,
};
use super::repo::{self, SocialLink, UserProfile};
use crate::auth::repo_types::{PublicUser, User};
use crate::auth::AuthContext;
use crate::db::{like_pattern, StoreOutcome};
use crate::error::{AppError, AppResult};
use crate::response::Pagination;

pub async fn list(
    db: &PgPool,
    search: Option<&str>,
    page: &Pagination,
) -> AppResult<(Vec<UserProfile>, i64)> {
    let pattern = like_pattern(search);
    let users = repo::list_profiles(db, pattern.as_deref(), page.limit(), page.offset()).await?;
    let total = repo::count_profiles(db, pattern.as_deref()).await?;
    Ok((users, total))
}

pub async fn profile(
    db: &PgPool,
    user_id: Uuid,
    viewer: Option<AuthContext>,
) -> AppResult<ProfileResponse> {
    let user = match repo::find_profile(db, user_id).await {
        StoreOutcome::Found(user) => user,
        StoreOutcome::NotFound | StoreOutcome::Conflict { .. } => {
            return Err(AppError::not_found("User not found"))
        }
        StoreOutcome::Failure(e) => return Err(e.into()),
    };
    let skills = repo::list_skills(db, user_id).await?;
    let social_links = repo::list_social_links(db, user_id).await?;

    Ok(ProfileResponse {
        user,
        skills,
        social_links,
        is_own_profile: viewer.is_some_and(|v| v.user_id == user_id),
    })
}

pub async fn update_profile(
    db: &PgPool,
    ctx: AuthContext,
    changes: UpdateProfileRequest,
) -> AppResult<PublicUser> {
    match repo::update_profile(db, ctx.user_id, changes).await {
        StoreOutcome::Found(user) => {
            info!(user_id = %ctx.user_id, "profile updated");
            Ok(user)
        }
        StoreOutcome::NotFound => Err(AppError::not_found("User not found")),
        StoreOutcome::Conflict { constraint } => Err(AppError::validation(format!(
            "Value already in use ({})",
            constraint.unwrap_or_default()
        ))),
        StoreOutcome::Failure(e) => Err(e.into()),
    }
}

/// Replace-set: the stored skills become exactly `req.skills`.
pub async fn replace_skills(
    db: &PgPool,
    ctx: AuthContext,
    req: UpdateSkillsRequest,
) -> AppResult<Vec<String>> {
    let skills = normalize_skills(&req.skills);

    let mut tx = db.begin().await.map_err(AppError::tx)?;
    ensure_user(&mut tx, ctx.user_id).await?;
    repo::replace_skills(&mut tx, ctx.user_id, &skills)
        .await
        .map_err(AppError::tx)?;
    tx.commit().await.map_err(AppError::tx)?;

    info!(user_id = %ctx.user_id, count = skills.len(), "skills replaced");
    Ok(skills)
}

/// Replace-set over the known platforms.
pub async fn replace_social_links(
    db: &PgPool,
    ctx: AuthContext,
    req: UpdateSocialLinksRequest,
) -> AppResult<Vec<SocialLink>> {
    let links = req.links();

    let mut tx = db.begin().await.map_err(AppError::tx)?;
    ensure_user(&mut tx, ctx.user_id).await?;
    repo::replace_social_links(&mut tx, ctx.user_id, &links)
        .await
        .map_err(AppError::tx)?;
    tx.commit().await.map_err(AppError::tx)?;

    info!(user_id = %ctx.user_id, count = links.len(), "social links replaced");
    Ok(links)
}

pub async fn delete_account(db: &PgPool, ctx: AuthContext) -> AppResult<()> {
    match User::delete(db, ctx.user_id).await {
        StoreOutcome::Found(_) => {
            info!(user_id = %ctx.user_id, "account deleted");
            Ok(())
        }
        StoreOutcome::NotFound | StoreOutcome::Conflict { .. } => {
            Err(AppError::not_found("User not found"))
        }
        StoreOutcome::Failure(e) => Err(e.into()),
    }
}

/// A token can outlive its user; writes for a deleted user are a 404, not a
/// foreign-key failure.
async fn ensure_user(conn: &mut sqlx::PgConnection, user_id: Uuid) -> AppResult<()> {
    match User::exists(conn, user_id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(AppError::not_found("User not found")),
        Err(e) => Err(AppError::tx(e)),
    }
}
