use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ContentError;

pub const DEFAULT_COVER_IMAGE: &str = "/assets/images/blog/default.jpg";
pub const DEFAULT_READ_TIME: u32 = 5;
pub const DEFAULT_TAG_COLOR: &str = "#5A5d80";
/// Colour given to tags created implicitly while saving a post.
pub const IMPLICIT_TAG_COLOR: &str = "#333333";
pub const PLACEHOLDER_AUTHOR: &str = "Blog Author";
pub const PLACEHOLDER_AVATAR: &str = "/assets/images/profile-placeholder.jpg";

// ==================== Модели постов ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, PostStatus::Published)
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PostStatus {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(ContentError::InvalidRequest(format!(
                "unknown post status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub avatar: Option<String>,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            name: PLACEHOLDER_AUTHOR.to_string(),
            avatar: Some(PLACEHOLDER_AVATAR.to_string()),
        }
    }
}

/// A blog entry as the rest of the application sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: String,
    /// Tag names in display order, without duplicates.
    pub tags: Vec<String>,
    /// The backend has no categories; always empty.
    pub categories: Vec<String>,
    pub status: PostStatus,
    pub publish_date: Option<DateTime<Utc>>,
    pub read_time: u32,
    pub author: Author,
    pub likes: u32,
    pub featured: bool,
}

impl Post {
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t == name)
    }
}

/// Tags as typed into the editor: either one comma separated string or a
/// ready list of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagNames {
    Csv(String),
    List(Vec<String>),
}

impl Default for TagNames {
    fn default() -> Self {
        TagNames::List(Vec::new())
    }
}

impl TagNames {
    /// Trimmed, non-empty names, de-duplicated case-insensitively. The first
    /// spelling of a name wins.
    pub fn normalize(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            TagNames::Csv(s) => s.split(',').collect(),
            TagNames::List(names) => names.iter().map(String::as_str).collect(),
        };

        let mut names: Vec<String> = Vec::with_capacity(raw.len());
        for name in raw.into_iter().map(str::trim).filter(|n| !n.is_empty()) {
            if !names.iter().any(|n| n.to_lowercase() == name.to_lowercase()) {
                names.push(name.to_string());
            }
        }
        names
    }
}

impl From<&str> for TagNames {
    fn from(s: &str) -> Self {
        TagNames::Csv(s.to_string())
    }
}

impl From<String> for TagNames {
    fn from(s: String) -> Self {
        TagNames::Csv(s)
    }
}

impl From<Vec<String>> for TagNames {
    fn from(names: Vec<String>) -> Self {
        TagNames::List(names)
    }
}

impl From<Vec<&str>> for TagNames {
    fn from(names: Vec<&str>) -> Self {
        TagNames::List(names.into_iter().map(str::to_string).collect())
    }
}

/// Editor input for creating (`id == None`) or updating a post.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostInput {
    pub id: Option<String>,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub tags: TagNames,
    pub status: PostStatus,
    pub read_time: Option<u32>,
    pub publish_date: Option<DateTime<Utc>>,
    pub seo_description: Option<String>,
}

impl PostInput {
    pub fn new(title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        if self.title.trim().is_empty() {
            return Err(ContentError::InvalidRequest(
                "Title cannot be empty".to_string(),
            ));
        }
        if self.slug.trim().is_empty() {
            return Err(ContentError::InvalidRequest(
                "Slug cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ==================== Модели тегов ====================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub color_code: String,
}

impl Tag {
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// Editable tag fields, sent as-is on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFields {
    pub name: String,
    pub description: Option<String>,
    pub color_code: String,
}

impl TagFields {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            color_code: DEFAULT_TAG_COLOR.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        if self.name.trim().is_empty() {
            return Err(ContentError::InvalidRequest(
                "Tag name cannot be empty".to_string(),
            ));
        }
        if !is_hex_color(&self.color_code) {
            return Err(ContentError::InvalidRequest(format!(
                "Invalid hex color: {}",
                self.color_code
            )));
        }
        Ok(())
    }
}

/// `#` followed by 3 to 6 hex digits.
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(digits) => {
            (3..=6).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}
