use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::StoreOutcome;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub message: String,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// One row per conversation partner, carrying the latest message exchanged.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConversationSummary {
    pub partner_id: Uuid,
    pub partner_name: String,
    pub partner_username: String,
    pub partner_avatar_url: Option<String>,
    pub last_message_id: Uuid,
    pub last_message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_message_at: OffsetDateTime,
    pub sent_by_me: bool,
    pub unread_count: i64,
}

pub async fn insert(
    db: impl PgExecutor<'_>,
    sender_id: Uuid,
    recipient_id: Uuid,
    body: &str,
) -> StoreOutcome<Message> {
    let res = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (sender_id, recipient_id, message)
        VALUES ($1, $2, $3)
        RETURNING id, sender_id, recipient_id, message, is_read, created_at
        "#,
    )
    .bind(sender_id)
    .bind(recipient_id)
    .bind(body)
    .fetch_optional(db)
    .await;
    StoreOutcome::from_result(res)
}

pub async fn conversations(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
) -> Result<Vec<ConversationSummary>, sqlx::Error> {
    sqlx::query_as::<_, ConversationSummary>(
        r#"
        WITH mine AS (
            SELECT id, sender_id, message, created_at,
                   CASE WHEN sender_id = $1 THEN recipient_id ELSE sender_id END AS partner_id
            FROM messages
            WHERE sender_id = $1 OR recipient_id = $1
        ),
        latest AS (
            SELECT DISTINCT ON (partner_id) partner_id, id, sender_id, message, created_at
            FROM mine
            ORDER BY partner_id, created_at DESC, id DESC
        )
        SELECT l.partner_id,
               u.name AS partner_name,
               u.username AS partner_username,
               u.avatar_url AS partner_avatar_url,
               l.id AS last_message_id,
               l.message AS last_message,
               l.created_at AS last_message_at,
               (l.sender_id = $1) AS sent_by_me,
               (SELECT COUNT(*)
                  FROM messages x
                 WHERE x.sender_id = l.partner_id
                   AND x.recipient_id = $1
                   AND NOT x.is_read) AS unread_count
        FROM latest l
        JOIN users u ON u.id = l.partner_id
        ORDER BY l.created_at DESC, l.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Messages exchanged between two users, newest first.
pub async fn between(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    other_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        r#"
        SELECT id, sender_id, recipient_id, message, is_read, created_at
        FROM messages
        WHERE (sender_id = $1 AND recipient_id = $2)
           OR (sender_id = $2 AND recipient_id = $1)
        ORDER BY created_at DESC, id DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(other_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn unread_count(db: impl PgExecutor<'_>, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"SELECT COUNT(*) FROM messages WHERE recipient_id = $1 AND NOT is_read"#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await
}

/// Matches only when the caller is the recipient. Re-marking is a no-op
/// that still returns the row.
pub async fn mark_read(
    db: impl PgExecutor<'_>,
    id: Uuid,
    recipient_id: Uuid,
) -> StoreOutcome<Message> {
    let res = sqlx::query_as::<_, Message>(
        r#"
        UPDATE messages
           SET is_read = TRUE
         WHERE id = $1 AND recipient_id = $2
        RETURNING id, sender_id, recipient_id, message, is_read, created_at
        "#,
    )
    .bind(id)
    .bind(recipient_id)
    .fetch_optional(db)
    .await;
    StoreOutcome::from_result(res)
}

/// Matches only when the caller is the sender.
pub async fn delete(db: impl PgExecutor<'_>, id: Uuid, sender_id: Uuid) -> StoreOutcome<Uuid> {
    let res = sqlx::query_scalar::<_, Uuid>(
        r#"DELETE FROM messages WHERE id = $1 AND sender_id = $2 RETURNING id"#,
    )
    .bind(id)
    .bind(sender_id)
    .fetch_optional(db)
    .await;
    StoreOutcome::from_result(res)
}
