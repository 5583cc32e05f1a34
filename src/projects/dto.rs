use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::db::PartialUpdate;
use crate::extract::not_blank;
use crate::response::{default_limit, Pagination};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(
        length(min = 1, max = 200, message = "Title is required"),
        custom(function = "not_blank", message = "Title is required")
    )]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 30, message = "At most 30 technologies"))]
    pub tech_stack: Option<Vec<String>>,
    #[validate(length(max = 500))]
    pub repo_url: Option<String>,
    #[validate(length(max = 500))]
    pub live_url: Option<String>,
    #[validate(length(max = 500))]
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(
        length(min = 1, max = 200, message = "Title cannot be empty"),
        custom(function = "not_blank", message = "Title cannot be empty")
    )]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 30, message = "At most 30 technologies"))]
    pub tech_stack: Option<Vec<String>>,
    #[validate(length(max = 500))]
    pub repo_url: Option<String>,
    #[validate(length(max = 500))]
    pub live_url: Option<String>,
    #[validate(length(max = 500))]
    pub image_url: Option<String>,
}

impl UpdateProjectRequest {
    pub fn apply(self, upd: &mut PartialUpdate<'_>) {
        upd.set("title", self.title.map(|t| t.trim().to_string()))
            .set("description", self.description)
            .set("tech_stack", self.tech_stack)
            .set("repo_url", self.repo_url)
            .set("live_url", self.live_url)
            .set("image_url", self.image_url);
    }
}

#[derive(Debug, Deserialize)]
pub struct ProjectsQuery {
    pub search: Option<String>,
    pub user_id: Option<Uuid>,
    pub featured: Option<bool>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl ProjectsQuery {
    pub fn page(&self) -> Pagination {
        Pagination {
            limit: self.limit,
            offset: self.offset,
        }
    }
}
