use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{CreateProjectRequest, UpdateProjectRequest};
use crate::db::{PartialUpdate, StoreOutcome};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub repo_url: Option<String>,
    pub live_url: Option<String>,
    pub image_url: Option<String>,
    pub is_featured: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Listing filters; `None` means "don't filter on this".
#[derive(Debug, Default)]
pub struct ProjectFilter {
    pub pattern: Option<String>,
    pub user_id: Option<Uuid>,
    pub featured: Option<bool>,
}

pub async fn list(
    db: impl PgExecutor<'_>,
    filter: &ProjectFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        r#"
        SELECT id, user_id, title, description, tech_stack, repo_url, live_url,
               image_url, is_featured, created_at, updated_at
        FROM projects
        WHERE ($1::text IS NULL
               OR title ILIKE $1
               OR description ILIKE $1
               OR array_to_string(tech_stack, ' ') ILIKE $1)
          AND ($2::uuid IS NULL OR user_id = $2)
          AND ($3::bool IS NULL OR is_featured = $3)
        ORDER BY created_at DESC, id
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(filter.pattern.as_deref())
    .bind(filter.user_id)
    .bind(filter.featured)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn count(db: impl PgExecutor<'_>, filter: &ProjectFilter) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM projects
        WHERE ($1::text IS NULL
               OR title ILIKE $1
               OR description ILIKE $1
               OR array_to_string(tech_stack, ' ') ILIKE $1)
          AND ($2::uuid IS NULL OR user_id = $2)
          AND ($3::bool IS NULL OR is_featured = $3)
        "#,
    )
    .bind(filter.pattern.as_deref())
    .bind(filter.user_id)
    .bind(filter.featured)
    .fetch_one(db)
    .await
}

pub async fn find(db: impl PgExecutor<'_>, id: Uuid) -> StoreOutcome<Project> {
    let res = sqlx::query_as::<_, Project>(
        r#"
        SELECT id, user_id, title, description, tech_stack, repo_url, live_url,
               image_url, is_featured, created_at, updated_at
        FROM projects
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await;
    StoreOutcome::from_result(res)
}

pub async fn find_owner(db: impl PgExecutor<'_>, id: Uuid) -> StoreOutcome<Uuid> {
    let res = sqlx::query_scalar::<_, Uuid>(r#"SELECT user_id FROM projects WHERE id = $1"#)
        .bind(id)
        .fetch_optional(db)
        .await;
    StoreOutcome::from_result(res)
}

pub async fn featured_by_user(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        r#"
        SELECT id, user_id, title, description, tech_stack, repo_url, live_url,
               image_url, is_featured, created_at, updated_at
        FROM projects
        WHERE user_id = $1 AND is_featured
        ORDER BY created_at DESC, id
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn insert(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    new: CreateProjectRequest,
) -> StoreOutcome<Project> {
    let res = sqlx::query_as::<_, Project>(
        r#"
        INSERT INTO projects (user_id, title, description, tech_stack, repo_url, live_url, image_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, user_id, title, description, tech_stack, repo_url, live_url,
                  image_url, is_featured, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(new.title.trim())
    .bind(new.description.unwrap_or_default())
    .bind(new.tech_stack.unwrap_or_default())
    .bind(new.repo_url)
    .bind(new.live_url)
    .bind(new.image_url)
    .fetch_optional(db)
    .await;
    StoreOutcome::from_result(res)
}

pub async fn update(
    db: impl PgExecutor<'_>,
    id: Uuid,
    changes: UpdateProjectRequest,
) -> StoreOutcome<Project> {
    let mut upd = PartialUpdate::new("projects");
    changes.apply(&mut upd);
    let mut qb = upd.finish(
        "id",
        id,
        "id, user_id, title, description, tech_stack, repo_url, live_url, \
         image_url, is_featured, created_at, updated_at",
    );
    let res = qb.build_query_as::<Project>().fetch_optional(db).await;
    StoreOutcome::from_result(res)
}

pub async fn toggle_featured(db: impl PgExecutor<'_>, id: Uuid) -> StoreOutcome<Project> {
    let res = sqlx::query_as::<_, Project>(
        r#"
        UPDATE projects
           SET is_featured = NOT is_featured, updated_at = NOW()
         WHERE id = $1
        RETURNING id, user_id, title, description, tech_stack, repo_url, live_url,
                  image_url, is_featured, created_at, updated_at
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await;
    StoreOutcome::from_result(res)
}

pub async fn delete(db: impl PgExecutor<'_>, id: Uuid) -> StoreOutcome<Uuid> {
    let res = sqlx::query_scalar::<_, Uuid>(r#"DELETE FROM projects WHERE id = $1 RETURNING id"#)
        .bind(id)
        .fetch_optional(db)
        .await;
    StoreOutcome::from_result(res)
}
