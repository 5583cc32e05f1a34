use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::db::StoreOutcome;

/// Fields written at registration.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

impl User {
    pub async fn find_by_email(db: impl PgExecutor<'_>, email: &str) -> StoreOutcome<User> {
        let res = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, password_hash, bio, avatar_url,
                   cover_image_url, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await;
        StoreOutcome::from_result(res)
    }

    pub async fn find_by_id(db: impl PgExecutor<'_>, id: Uuid) -> StoreOutcome<User> {
        let res = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, password_hash, bio, avatar_url,
                   cover_image_url, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await;
        StoreOutcome::from_result(res)
    }

    /// Any user already holding either the username or the email.
    pub async fn find_by_username_or_email(
        db: impl PgExecutor<'_>,
        username: &str,
        email: &str,
    ) -> StoreOutcome<User> {
        let res = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, password_hash, bio, avatar_url,
                   cover_image_url, created_at, updated_at
            FROM users
            WHERE username = $1 OR email = $2
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_optional(db)
        .await;
        StoreOutcome::from_result(res)
    }

    pub async fn insert(conn: &mut PgConnection, new: &NewUser<'_>) -> StoreOutcome<User> {
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, username, email, password_hash, bio, avatar_url,
                      cover_image_url, created_at, updated_at
            "#,
        )
        .bind(new.name)
        .bind(new.username)
        .bind(new.email)
        .bind(new.password_hash)
        .fetch_optional(conn)
        .await;
        StoreOutcome::from_result(res)
    }

    pub async fn update_password(
        db: impl PgExecutor<'_>,
        id: Uuid,
        password_hash: &str,
    ) -> StoreOutcome<Uuid> {
        let res = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE users
               SET password_hash = $2, updated_at = NOW()
             WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .fetch_optional(db)
        .await;
        StoreOutcome::from_result(res)
    }

    /// Owned portfolio, skills, social links, projects and messages go with
    /// the row through `ON DELETE CASCADE`.
    pub async fn delete(db: impl PgExecutor<'_>, id: Uuid) -> StoreOutcome<Uuid> {
        let res = sqlx::query_scalar::<_, Uuid>(r#"DELETE FROM users WHERE id = $1 RETURNING id"#)
            .bind(id)
            .fetch_optional(db)
            .await;
        StoreOutcome::from_result(res)
    }

    pub async fn exists(db: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(r#"SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)"#)
            .bind(id)
            .fetch_one(db)
            .await
    }
}
