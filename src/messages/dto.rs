use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::extract::not_blank;
use crate::response::{default_limit, Pagination};

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    #[validate(
        length(min = 1, max = 5000, message = "Message must be 1-5000 characters"),
        custom(function = "not_blank", message = "Message must not be blank")
    )]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ConversationQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl ConversationQuery {
    pub fn page(&self) -> Pagination {
        Pagination {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread_count: i64,
}
