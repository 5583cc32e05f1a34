use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::dto::{PortfolioResponse, UpdatePortfolioRequest};
use super::repo;
use crate::auth::AuthContext;
use crate::db::StoreOutcome;
use crate::error::{AppError, AppResult};
use crate::projects::repo as project_repo;
use crate::users::dto::normalize_skills;
use crate::users::repo as user_repo;

/// Portfolio, owner profile, skills and featured projects in one response.
pub async fn get(
    db: &PgPool,
    user_id: Uuid,
    viewer: Option<AuthContext>,
) -> AppResult<PortfolioResponse> {
    let portfolio = match repo::find_by_user(db, user_id).await {
        StoreOutcome::Found(p) => p,
        StoreOutcome::NotFound | StoreOutcome::Conflict { .. } => {
            return Err(AppError::not_found("Portfolio not found"))
        }
        StoreOutcome::Failure(e) => return Err(e.into()),
    };
    let user = match user_repo::find_profile(db, user_id).await {
        StoreOutcome::Found(u) => u,
        StoreOutcome::NotFound | StoreOutcome::Conflict { .. } => {
            return Err(AppError::not_found("User not found"))
        }
        StoreOutcome::Failure(e) => return Err(e.into()),
    };
    let skills = user_repo::list_skills(db, user_id).await?;
    let featured_projects = project_repo::featured_by_user(db, user_id).await?;

    Ok(PortfolioResponse {
        portfolio,
        user,
        skills,
        featured_projects,
        is_owner: viewer.is_some_and(|v| v.user_id == user_id),
    })
}

/// Text fields, skills and featured set change together or not at all.
pub async fn update(
    db: &PgPool,
    ctx: AuthContext,
    req: UpdatePortfolioRequest,
) -> AppResult<PortfolioResponse> {
    let (fields, skills, featured) = req.split();

    let mut tx = db.begin().await.map_err(AppError::tx)?;

    match repo::update_fields(&mut *tx, ctx.user_id, fields).await {
        StoreOutcome::Found(_) => {}
        StoreOutcome::NotFound => return Err(AppError::not_found("Portfolio not found")),
        StoreOutcome::Conflict { constraint } => {
            return Err(AppError::tx(format!(
                "portfolio update conflict ({})",
                constraint.unwrap_or_default()
            )))
        }
        StoreOutcome::Failure(e) => return Err(AppError::tx(e)),
    }

    if let Some(skills) = skills {
        let skills = normalize_skills(&skills);
        user_repo::replace_skills(&mut tx, ctx.user_id, &skills)
            .await
            .map_err(AppError::tx)?;
    }

    if let Some(ids) = featured {
        let featured = repo::replace_featured(&mut tx, ctx.user_id, &ids)
            .await
            .map_err(AppError::tx)?;
        if featured as usize != ids.len() {
            info!(
                user_id = %ctx.user_id,
                requested = ids.len(),
                featured,
                "some featured project ids were not owned by the caller"
            );
        }
    }

    tx.commit().await.map_err(AppError::tx)?;
    info!(user_id = %ctx.user_id, "portfolio updated");

    get(db, ctx.user_id, Some(ctx)).await
}
