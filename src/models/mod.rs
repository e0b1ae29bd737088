//! Data models for the amicale content backend.
//!
//! Items are free-form JSON objects whose shape varies per category; identity
//! for deletion is full structural equality, which is why there is no typed
//! per-category record here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single content item: a mapping from field name to JSON value.
pub type Item = serde_json::Map<String, Value>;

/// The five fixed content collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    ChiefMessages,
    AmicalistMessages,
    Recruits,
    Events,
    FlashNews,
}

impl Category {
    /// Parse a wire-format collection name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "chiefMessages" => Some(Category::ChiefMessages),
            "amicalistMessages" => Some(Category::AmicalistMessages),
            "recruits" => Some(Category::Recruits),
            "events" => Some(Category::Events),
            "flashNews" => Some(Category::FlashNews),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ChiefMessages => "chiefMessages",
            Category::AmicalistMessages => "amicalistMessages",
            Category::Recruits => "recruits",
            Category::Events => "events",
            Category::FlashNews => "flashNews",
        }
    }

    /// The two carousel message categories get author/text audit metadata;
    /// the rest are logged by name or title.
    pub fn is_message(&self) -> bool {
        matches!(self, Category::ChiefMessages | Category::AmicalistMessages)
    }
}

/// The root content document persisted as `db.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDb {
    #[serde(default)]
    pub chief_messages: Vec<Item>,
    #[serde(default)]
    pub amicalist_messages: Vec<Item>,
    #[serde(default)]
    pub recruits: Vec<Item>,
    #[serde(default)]
    pub events: Vec<Item>,
    #[serde(default)]
    pub flash_news: Vec<Item>,
}

impl ContentDb {
    pub fn collection(&self, category: Category) -> &Vec<Item> {
        match category {
            Category::ChiefMessages => &self.chief_messages,
            Category::AmicalistMessages => &self.amicalist_messages,
            Category::Recruits => &self.recruits,
            Category::Events => &self.events,
            Category::FlashNews => &self.flash_news,
        }
    }

    pub fn collection_mut(&mut self, category: Category) -> &mut Vec<Item> {
        match category {
            Category::ChiefMessages => &mut self.chief_messages,
            Category::AmicalistMessages => &mut self.amicalist_messages,
            Category::Recruits => &mut self.recruits,
            Category::Events => &mut self.events,
            Category::FlashNews => &mut self.flash_news,
        }
    }
}

/// Request body shared by `POST /api/save` and `POST /api/delete`.
#[derive(Debug, Clone, Deserialize)]
pub struct MutationRequest {
    pub category: String,
    pub item: Item,
}

/// Success envelope for mutations.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}

/// Response body for `GET /api/last-modified`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LastModified {
    pub last_modified: f64,
}

/// Response body for `POST /api/upload`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub path: String,
}

/// Credentials for `POST /api/auth/login` and `POST /api/auth/signup`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Profile-enriched user record mirrored back to the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub username: String,
    pub is_validated: bool,
}

/// Response body for a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserProfile,
}

/// Response body for `GET /api/auth/session`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: UserProfile,
}
