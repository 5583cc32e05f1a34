use serde::{Deserialize, Serialize};
use validator::Validate;

use super::repo::{SocialLink, UserProfile};
use crate::db::PartialUpdate;
use crate::extract::not_blank;
use crate::response::{default_limit, Pagination};

pub const MAX_SKILLS: usize = 50;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 1, max = 100, message = "Name cannot be empty"),
        custom(function = "not_blank", message = "Name cannot be empty")
    )]
    pub name: Option<String>,
    #[validate(length(max = 1000, message = "Bio must be at most 1000 characters"))]
    pub bio: Option<String>,
    #[validate(length(max = 500))]
    pub avatar_url: Option<String>,
    #[validate(length(max = 500))]
    pub cover_image_url: Option<String>,
}

impl UpdateProfileRequest {
    /// Fixed column order: name, bio, avatar_url, cover_image_url.
    pub fn apply(self, upd: &mut PartialUpdate<'_>) {
        upd.set("name", self.name.map(|n| n.trim().to_string()))
            .set("bio", self.bio)
            .set("avatar_url", self.avatar_url)
            .set("cover_image_url", self.cover_image_url);
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSkillsRequest {
    #[validate(length(max = 50, message = "At most 50 skills"))]
    pub skills: Vec<String>,
}

/// Trims labels, drops blanks and keeps the first occurrence of each
/// (case-insensitive) label.
pub fn normalize_skills(raw: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(str::to_string)
        .take(MAX_SKILLS)
        .collect()
}

pub const SOCIAL_PLATFORMS: [&str; 4] = ["github", "linkedin", "twitter", "website"];

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSocialLinksRequest {
    #[validate(length(max = 500))]
    pub github: Option<String>,
    #[validate(length(max = 500))]
    pub linkedin: Option<String>,
    #[validate(length(max = 500))]
    pub twitter: Option<String>,
    #[validate(length(max = 500))]
    pub website: Option<String>,
}

impl UpdateSocialLinksRequest {
    /// Rows to store: one per platform with a non-blank value. Blank or
    /// missing platforms produce nothing.
    pub fn links(&self) -> Vec<SocialLink> {
        let values = [&self.github, &self.linkedin, &self.twitter, &self.website];
        SOCIAL_PLATFORMS
            .iter()
            .zip(values)
            .filter_map(|(platform, value)| {
                let url = value.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
                Some(SocialLink {
                    platform: (*platform).to_string(),
                    url: url.to_string(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl UsersQuery {
    pub fn page(&self) -> Pagination {
        Pagination {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserProfile,
    pub skills: Vec<String>,
    pub social_links: Vec<SocialLink>,
    pub is_own_profile: bool,
}
