//! Translation between wire records and domain models.
//!
//! Inbound mapping is total: it never fails and never drops a record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::dto::{PostDto, PostPayload, TagDto};
use crate::models::{
    Author, Post, PostInput, PostStatus, Tag, DEFAULT_COVER_IMAGE, DEFAULT_READ_TIME,
    DEFAULT_TAG_COLOR,
};

impl From<PostDto> for Post {
    fn from(dto: PostDto) -> Self {
        let mut tags: Vec<String> = Vec::with_capacity(dto.tags.len());
        for name in dto.tags.into_iter().filter_map(|t| t.name) {
            if !tags.contains(&name) {
                tags.push(name);
            }
        }

        Self {
            id: dto.id.unwrap_or_default(),
            slug: dto.slug.unwrap_or_default(),
            title: dto.title.unwrap_or_default(),
            excerpt: dto.excerpt.unwrap_or_default(),
            content: dto.content.unwrap_or_default(),
            cover_image: dto
                .featured_image
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_COVER_IMAGE.to_string()),
            tags,
            categories: Vec::new(),
            status: parse_status(dto.status.as_ref()),
            publish_date: dto.publication_dt.as_deref().and_then(parse_timestamp),
            read_time: read_time(dto.reading_time),
            author: Author::default(),
            likes: 0,
            featured: false,
        }
    }
}

impl From<TagDto> for Tag {
    fn from(dto: TagDto) -> Self {
        Self {
            id: dto.id.unwrap_or_default(),
            name: dto.name.unwrap_or_default(),
            description: dto.description.filter(|d| !d.is_empty()),
            color_code: dto
                .color_code
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string()),
        }
    }
}

/// Collapse the backend's status variants into the two canonical states.
pub fn parse_status(raw: Option<&Value>) -> PostStatus {
    match raw {
        Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("published") => {
            PostStatus::Published
        }
        Some(Value::Bool(true)) => PostStatus::Published,
        _ => PostStatus::Draft,
    }
}

/// RFC 3339, or a naive date/datetime interpreted as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn read_time(raw: Option<f64>) -> u32 {
    match raw {
        Some(minutes) if minutes.is_finite() && minutes > 0.0 => {
            minutes.ceil().min(u32::MAX as f64) as u32
        }
        _ => DEFAULT_READ_TIME,
    }
}

/// Build the outbound body once tag names have been resolved to ids.
///
/// A published post without a publish date is stamped with `now`.
pub fn to_payload(input: &PostInput, tag_ids: Vec<String>, now: DateTime<Utc>) -> PostPayload {
    let publication_dt = match (input.publish_date, input.status) {
        (Some(date), _) => Some(date.to_rfc3339()),
        (None, PostStatus::Published) => Some(now.to_rfc3339()),
        (None, PostStatus::Draft) => None,
    };

    PostPayload {
        title: input.title.clone(),
        slug: input.slug.clone(),
        content: input.content.clone(),
        excerpt: non_empty(&input.excerpt),
        featured_image: non_empty(&input.cover_image),
        tag_ids,
        status: input.status.as_str().to_string(),
        reading_time: input.read_time.filter(|m| *m > 0),
        seo_description: non_empty(&input.seo_description),
        publication_dt,
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
