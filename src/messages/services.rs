use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::dto::SendMessageRequest;
use super::repo::{self, ConversationSummary, Message};
use crate::auth::repo_types::User;
use crate::auth::AuthContext;
use crate::db::StoreOutcome;
use crate::error::{AppError, AppResult};
use crate::response::Pagination;

/// Self-addressed messages are refused before anything is read or written.
pub fn ensure_not_self(recipient_id: Uuid, ctx: AuthContext) -> AppResult<()> {
    if recipient_id == ctx.user_id {
        Err(AppError::SelfMessage)
    } else {
        Ok(())
    }
}

pub async fn send(db: &PgPool, ctx: AuthContext, req: SendMessageRequest) -> AppResult<Message> {
    ensure_not_self(req.recipient_id, ctx)?;

    if !User::exists(db, req.recipient_id).await? {
        return Err(AppError::not_found("Recipient not found"));
    }

    match repo::insert(db, ctx.user_id, req.recipient_id, &req.message).await {
        StoreOutcome::Found(m) => {
            info!(message_id = %m.id, sender = %ctx.user_id, recipient = %m.recipient_id, "message sent");
            Ok(m)
        }
        StoreOutcome::NotFound | StoreOutcome::Conflict { .. } => {
            Err(AppError::tx("insert message returned no row"))
        }
        // Recipient deleted between the check and the insert.
        StoreOutcome::Failure(e) if is_fk_violation(&e) => {
            Err(AppError::not_found("Recipient not found"))
        }
        StoreOutcome::Failure(e) => Err(e.into()),
    }
}

pub async fn conversations(db: &PgPool, ctx: AuthContext) -> AppResult<Vec<ConversationSummary>> {
    Ok(repo::conversations(db, ctx.user_id).await?)
}

pub async fn conversation(
    db: &PgPool,
    ctx: AuthContext,
    other_id: Uuid,
    page: &Pagination,
) -> AppResult<Vec<Message>> {
    if !User::exists(db, other_id).await? {
        return Err(AppError::not_found("User not found"));
    }
    let messages = repo::between(db, ctx.user_id, other_id, page.limit(), page.offset()).await?;
    debug!(count = messages.len(), "conversation loaded");
    Ok(messages)
}

pub async fn unread_count(db: &PgPool, ctx: AuthContext) -> AppResult<i64> {
    Ok(repo::unread_count(db, ctx.user_id).await?)
}

pub async fn mark_read(db: &PgPool, ctx: AuthContext, id: Uuid) -> AppResult<Message> {
    match repo::mark_read(db, id, ctx.user_id).await {
        StoreOutcome::Found(m) => Ok(m),
        StoreOutcome::NotFound | StoreOutcome::Conflict { .. } => Err(message_not_found()),
        StoreOutcome::Failure(e) => Err(e.into()),
    }
}

pub async fn delete(db: &PgPool, ctx: AuthContext, id: Uuid) -> AppResult<()> {
    match repo::delete(db, id, ctx.user_id).await {
        StoreOutcome::Found(_) => {
            info!(message_id = %id, "message deleted");
            Ok(())
        }
        StoreOutcome::NotFound | StoreOutcome::Conflict { .. } => Err(message_not_found()),
        StoreOutcome::Failure(e) => Err(e.into()),
    }
}

fn is_fk_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
}

fn message_not_found() -> AppError {
    AppError::not_found("Message not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_message_is_rejected() {
        let me = Uuid::new_v4();
        let err = ensure_not_self(me, AuthContext { user_id: me }).unwrap_err();
        assert!(matches!(err, AppError::SelfMessage));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

        assert!(ensure_not_self(Uuid::new_v4(), AuthContext { user_id: me }).is_ok());
    }

    #[test]
    fn pool_timeout_is_not_a_fk_violation() {
        assert!(!is_fk_violation(&sqlx::Error::PoolTimedOut));
    }
}
