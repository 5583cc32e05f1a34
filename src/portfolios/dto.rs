use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::repo::Portfolio;
use crate::db::PartialUpdate;
use crate::projects::repo::Project;
use crate::users::repo::UserProfile;

/// `PUT /portfolios`. Every field is optional; an absent field leaves the
/// stored value (or set) untouched, a present one replaces it.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePortfolioRequest {
    #[validate(length(max = 5000))]
    pub summary: Option<String>,
    #[validate(length(max = 10000))]
    pub experience: Option<String>,
    #[validate(length(max = 10000))]
    pub education: Option<String>,
    #[validate(length(max = 50, message = "At most 50 skills"))]
    pub skills: Option<Vec<String>>,
    #[validate(length(max = 50))]
    pub featured_projects: Option<Vec<Uuid>>,
}

impl UpdatePortfolioRequest {
    pub fn split(self) -> (PortfolioFields, Option<Vec<String>>, Option<Vec<Uuid>>) {
        let fields = PortfolioFields {
            summary: self.summary,
            experience: self.experience,
            education: self.education,
        };
        (fields, self.skills, self.featured_projects)
    }
}

/// Text columns of a portfolio update.
#[derive(Debug, Default)]
pub struct PortfolioFields {
    pub summary: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
}

impl PortfolioFields {
    /// Fixed column order: summary, experience, education.
    pub fn apply(self, upd: &mut PartialUpdate<'_>) {
        upd.set("summary", self.summary)
            .set("experience", self.experience)
            .set("education", self.education);
    }
}

#[derive(Debug, Serialize)]
pub struct PortfolioResponse {
    #[serde(flatten)]
    pub portfolio: Portfolio,
    pub user: UserProfile,
    pub skills: Vec<String>,
    pub featured_projects: Vec<Project>,
    pub is_owner: bool,
}
