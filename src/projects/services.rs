use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{CreateProjectRequest, ProjectsQuery, UpdateProjectRequest};
use super::repo::{self, Project, ProjectFilter};
use crate::auth::AuthContext;
use crate::db::{like_pattern, StoreOutcome};
use crate::error::{AppError, AppResult};

/// Ownership rule for project mutations. Unlike messages, a project that
/// exists but belongs to someone else is a 403.
pub fn ensure_owner(owner_id: Uuid, ctx: AuthContext) -> AppResult<()> {
    if owner_id == ctx.user_id {
        Ok(())
    } else {
        Err(AppError::forbidden("Not authorized to modify this project"))
    }
}

pub async fn list(db: &PgPool, q: &ProjectsQuery) -> AppResult<(Vec<Project>, i64)> {
    let page = q.page();
    let filter = ProjectFilter {
        pattern: like_pattern(q.search.as_deref()),
        user_id: q.user_id,
        featured: q.featured,
    };
    let projects = repo::list(db, &filter, page.limit(), page.offset()).await?;
    let total = repo::count(db, &filter).await?;
    Ok((projects, total))
}

pub async fn get(db: &PgPool, id: Uuid) -> AppResult<Project> {
    match repo::find(db, id).await {
        StoreOutcome::Found(p) => Ok(p),
        StoreOutcome::NotFound | StoreOutcome::Conflict { .. } => Err(project_not_found()),
        StoreOutcome::Failure(e) => Err(e.into()),
    }
}

pub async fn create(db: &PgPool, ctx: AuthContext, req: CreateProjectRequest) -> AppResult<Project> {
    match repo::insert(db, ctx.user_id, req).await {
        StoreOutcome::Found(p) => {
            info!(user_id = %ctx.user_id, project_id = %p.id, "project created");
            Ok(p)
        }
        StoreOutcome::NotFound => Err(AppError::tx("insert project returned no row")),
        StoreOutcome::Conflict { constraint } => Err(AppError::validation(format!(
            "Project conflicts with existing data ({})",
            constraint.unwrap_or_default()
        ))),
        StoreOutcome::Failure(e) => Err(e.into()),
    }
}

pub async fn update(
    db: &PgPool,
    ctx: AuthContext,
    id: Uuid,
    changes: UpdateProjectRequest,
) -> AppResult<Project> {
    check_owner(db, ctx, id).await?;
    match repo::update(db, id, changes).await {
        StoreOutcome::Found(p) => {
            info!(project_id = %id, "project updated");
            Ok(p)
        }
        StoreOutcome::NotFound | StoreOutcome::Conflict { .. } => Err(project_not_found()),
        StoreOutcome::Failure(e) => Err(e.into()),
    }
}

pub async fn delete(db: &PgPool, ctx: AuthContext, id: Uuid) -> AppResult<()> {
    check_owner(db, ctx, id).await?;
    match repo::delete(db, id).await {
        StoreOutcome::Found(_) => {
            info!(project_id = %id, "project deleted");
            Ok(())
        }
        StoreOutcome::NotFound | StoreOutcome::Conflict { .. } => Err(project_not_found()),
        StoreOutcome::Failure(e) => Err(e.into()),
    }
}

pub async fn toggle_featured(db: &PgPool, ctx: AuthContext, id: Uuid) -> AppResult<Project> {
    check_owner(db, ctx, id).await?;
    match repo::toggle_featured(db, id).await {
        StoreOutcome::Found(p) => {
            info!(project_id = %id, is_featured = p.is_featured, "project featured flag toggled");
            Ok(p)
        }
        StoreOutcome::NotFound | StoreOutcome::Conflict { .. } => Err(project_not_found()),
        StoreOutcome::Failure(e) => Err(e.into()),
    }
}

/// Fetches the owner before any mutation: missing → 404, foreign → 403.
async fn check_owner(db: &PgPool, ctx: AuthContext, id: Uuid) -> AppResult<()> {
    let owner_id = match repo::find_owner(db, id).await {
        StoreOutcome::Found(owner_id) => owner_id,
        StoreOutcome::NotFound | StoreOutcome::Conflict { .. } => return Err(project_not_found()),
        StoreOutcome::Failure(e) => return Err(e.into()),
    };
    ensure_owner(owner_id, ctx).map_err(|e| {
        warn!(project_id = %id, caller = %ctx.user_id, "project ownership check failed");
        e
    })
}

fn project_not_found() -> AppError {
    AppError::not_found("Project not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_passes_and_others_are_forbidden() {
        let owner = Uuid::new_v4();
        assert!(ensure_owner(owner, AuthContext { user_id: owner }).is_ok());

        let err = ensure_owner(owner, AuthContext { user_id: Uuid::new_v4() }).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
