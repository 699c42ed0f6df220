//! Wire representations of the content API.
//!
//! Incoming records are decoded leniently: a field that is missing, `null`
//! or of an unexpected JSON type decodes as `None` instead of failing the
//! whole record. The mapper fills in defaults afterwards.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PostDto {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub excerpt: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub publication_dt: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub reading_time: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub featured_image: Option<String>,
    /// Either a status string in any casing or a `published` boolean.
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub tags: Vec<TagDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TagDto {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub color_code: Option<String>,
}

/// `{ items: [...] }` envelope of the paginated post endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPage {
    #[serde(default, deserialize_with = "lenient_list")]
    pub items: Vec<PostDto>,
}

/// Bare array returned by `GET /tags/`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct TagList(#[serde(deserialize_with = "lenient_list")] pub Vec<TagDto>);

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// Outbound body for `POST /admin/blogs/` and `PUT /admin/blogs/{id}/`.
///
/// Absent optionals are sent as `null`, never omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostPayload {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub tag_ids: Vec<String>,
    pub status: String,
    pub reading_time: Option<u32>,
    pub seo_description: Option<String>,
    pub publication_dt: Option<String>,
}

/// Body used for implicit tag creation during post save.
#[derive(Debug, Clone, Serialize)]
pub struct NewTagPayload<'a> {
    pub name: &'a str,
    pub color_code: &'a str,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Strings pass through, numbers are rendered (numeric ids), anything else
/// is absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Keeps the elements that decode, drops the rest. A non-array is empty.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}
