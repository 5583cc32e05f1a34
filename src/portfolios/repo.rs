use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgExecutor};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::PortfolioFields;
use crate::db::{PartialUpdate, StoreOutcome};

pub const DEFAULT_SUMMARY: &str = "Welcome to my portfolio!";
pub const DEFAULT_EXPERIENCE: &str = "No experience added yet.";
pub const DEFAULT_EDUCATION: &str = "No education added yet.";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Portfolio {
    pub id: Uuid,
    pub user_id: Uuid,
    pub summary: String,
    pub experience: String,
    pub education: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Placeholder portfolio written together with a new user.
pub async fn insert_default(conn: &mut PgConnection, user_id: Uuid) -> StoreOutcome<Portfolio> {
    let res = sqlx::query_as::<_, Portfolio>(
        r#"
        INSERT INTO portfolios (user_id, summary, experience, education)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, summary, experience, education, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(DEFAULT_SUMMARY)
    .bind(DEFAULT_EXPERIENCE)
    .bind(DEFAULT_EDUCATION)
    .fetch_optional(conn)
    .await;
    StoreOutcome::from_result(res)
}

pub async fn find_by_user(db: impl PgExecutor<'_>, user_id: Uuid) -> StoreOutcome<Portfolio> {
    let res = sqlx::query_as::<_, Portfolio>(
        r#"
        SELECT id, user_id, summary, experience, education, created_at, updated_at
        FROM portfolios
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await;
    StoreOutcome::from_result(res)
}

/// Writes only the supplied text fields. With none supplied it still bumps
/// `updated_at`, which doubles as the existence check.
pub async fn update_fields(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    fields: PortfolioFields,
) -> StoreOutcome<Portfolio> {
    let mut upd = PartialUpdate::new("portfolios");
    fields.apply(&mut upd);
    let mut qb = upd.finish(
        "user_id",
        user_id,
        "id, user_id, summary, experience, education, created_at, updated_at",
    );
    let res = qb.build_query_as::<Portfolio>().fetch_optional(db).await;
    StoreOutcome::from_result(res)
}

/// Clears `is_featured` on all of the user's projects, then sets it on the
/// listed ids the user owns. Ids owned by others match nothing. Returns the
/// number of projects now featured.
pub async fn replace_featured(
    conn: &mut PgConnection,
    user_id: Uuid,
    project_ids: &[Uuid],
) -> Result<u64, sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE projects
           SET is_featured = FALSE, updated_at = NOW()
         WHERE user_id = $1 AND is_featured
        "#,
    )
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    if project_ids.is_empty() {
        return Ok(0);
    }

    let res = sqlx::query(
        r#"
        UPDATE projects
           SET is_featured = TRUE, updated_at = NOW()
         WHERE user_id = $1 AND id = ANY($2)
        "#,
    )
    .bind(user_id)
    .bind(project_ids)
    .execute(&mut *conn)
    .await?;
    Ok(res.rows_affected())
}
