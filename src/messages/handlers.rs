use axum::{
    extract::State,
    routing::{delete, get, post, put},
    Router,
};
use tracing::instrument;

use super::dto::{ConversationQuery, SendMessageRequest, UnreadCount};
use super::repo::{ConversationSummary, Message};
use super::services;
use crate::{
    auth::AuthUser,
    error::AppResult,
    extract::{IdPath, ValidQuery, ValidatedJson},
    response::{ApiResponse, PageMeta},
    state::AppState,
};

pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", post(send_message))
        .route("/messages/conversations", get(list_conversations))
        .route("/messages/conversations/:user_id", get(get_conversation))
        .route("/messages/unread-count", get(unread_count))
        .route("/messages/:message_id/read", put(mark_read))
        .route("/messages/:message_id", delete(delete_message))
}

#[instrument(skip(state, payload))]
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ValidatedJson(payload): ValidatedJson<SendMessageRequest>,
) -> AppResult<ApiResponse<Message>> {
    let message = services::send(&state.db, ctx, payload).await?;
    Ok(ApiResponse::created(message).with_message("Message sent successfully"))
}

#[instrument(skip(state))]
pub async fn list_conversations(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> AppResult<ApiResponse<Vec<ConversationSummary>>> {
    Ok(ApiResponse::ok(services::conversations(&state.db, ctx).await?))
}

#[instrument(skip(state))]
pub async fn get_conversation(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    IdPath(other_id): IdPath,
    ValidQuery(q): ValidQuery<ConversationQuery>,
) -> AppResult<ApiResponse<Vec<Message>>> {
    let page = q.page();
    let messages = services::conversation(&state.db, ctx, other_id, &page).await?;
    let meta = PageMeta::with_count(&page, messages.len());
    Ok(ApiResponse::ok(messages).with_pagination(meta))
}

#[instrument(skip(state))]
pub async fn unread_count(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> AppResult<ApiResponse<UnreadCount>> {
    let unread_count = services::unread_count(&state.db, ctx).await?;
    Ok(ApiResponse::ok(UnreadCount { unread_count }))
}

#[instrument(skip(state))]
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    IdPath(id): IdPath,
) -> AppResult<ApiResponse<Message>> {
    let message = services::mark_read(&state.db, ctx, id).await?;
    Ok(ApiResponse::ok(message).with_message("Message marked as read"))
}

#[instrument(skip(state))]
pub async fn delete_message(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    IdPath(id): IdPath,
) -> AppResult<ApiResponse<()>> {
    services::delete(&state.db, ctx, id).await?;
    Ok(ApiResponse::message("Message deleted successfully"))
}
