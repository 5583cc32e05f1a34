use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgExecutor};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::UpdateProfileRequest;
use crate::auth::repo_types::PublicUser;
use crate::db::{PartialUpdate, StoreOutcome};

/// What other people see of a user: no email, no hash.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

pub async fn find_profile(db: impl PgExecutor<'_>, id: Uuid) -> StoreOutcome<UserProfile> {
    let res = sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT id, name, username, bio, avatar_url, cover_image_url, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await;
    StoreOutcome::from_result(res)
}

/// `pattern` is an ILIKE pattern (see `db::like_pattern`), matched against
/// name and username.
pub async fn list_profiles(
    db: impl PgExecutor<'_>,
    pattern: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT id, name, username, bio, avatar_url, cover_image_url, created_at
        FROM users
        WHERE $1::text IS NULL OR name ILIKE $1 OR username ILIKE $1
        ORDER BY created_at DESC, id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn count_profiles(db: impl PgExecutor<'_>, pattern: Option<&str>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM users
        WHERE $1::text IS NULL OR name ILIKE $1 OR username ILIKE $1
        "#,
    )
    .bind(pattern)
    .fetch_one(db)
    .await
}

pub async fn update_profile(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    changes: UpdateProfileRequest,
) -> StoreOutcome<PublicUser> {
    let mut upd = PartialUpdate::new("users");
    changes.apply(&mut upd);
    let mut qb = upd.finish(
        "id",
        user_id,
        "id, name, username, email, bio, avatar_url, cover_image_url, created_at, updated_at",
    );
    let res = qb.build_query_as::<PublicUser>().fetch_optional(db).await;
    StoreOutcome::from_result(res)
}

// ---- Skills ----

pub async fn list_skills(db: impl PgExecutor<'_>, user_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT name
          FROM skills
         WHERE user_id = $1
         ORDER BY name ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Deletes every skill of the user, then inserts `skills`. Run inside a
/// transaction so readers never see the gap.
pub async fn replace_skills(
    conn: &mut PgConnection,
    user_id: Uuid,
    skills: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query(r#"DELETE FROM skills WHERE user_id = $1"#)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    if skills.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO skills (user_id, name)
        SELECT $1, UNNEST($2::text[])
        "#,
    )
    .bind(user_id)
    .bind(skills)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// ---- Social links ----

pub async fn list_social_links(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
) -> Result<Vec<SocialLink>, sqlx::Error> {
    sqlx::query_as::<_, SocialLink>(
        r#"
        SELECT platform, url
          FROM social_links
         WHERE user_id = $1
         ORDER BY platform ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Same replace-set shape as `replace_skills`, one row per platform.
pub async fn replace_social_links(
    conn: &mut PgConnection,
    user_id: Uuid,
    links: &[SocialLink],
) -> Result<(), sqlx::Error> {
    sqlx::query(r#"DELETE FROM social_links WHERE user_id = $1"#)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    if links.is_empty() {
        return Ok(());
    }

    let platforms: Vec<&str> = links.iter().map(|l| l.platform.as_str()).collect();
    let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
    sqlx::query(
        r#"
        INSERT INTO social_links (user_id, platform, url)
        SELECT $1, p, u FROM UNNEST($2::text[], $3::text[]) AS t(p, u)
        "#,
    )
    .bind(user_id)
    .bind(platforms)
    .bind(urls)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
