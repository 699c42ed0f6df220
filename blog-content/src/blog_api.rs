//! Repository over the content API.
//!
//! Public reads (`list_posts`, `get_post`) never fail: errors are logged and
//! degrade to an empty list or `None`. The public list drops drafts that
//! carry no publication date. Admin operations return errors to the
//! caller, except deletes, which report a plain success flag.

use chrono::Utc;

use crate::config::ClientConfig;
use crate::dto::{NewTagPayload, PostDto, PostPage, TagDto, TagList};
use crate::error::ContentError;
use crate::http_client::{ApiClient, ApiRequest};
use crate::mapper;
use crate::models::{Post, PostInput, Tag, TagFields, IMPLICIT_TAG_COLOR};

/// Filters for the public post list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PostQuery {
    /// Server-side full text search term.
    pub search: Option<String>,
    /// Client-side filter on an exact tag name. The backend only filters by
    /// tag id, and names are not resolved for reads.
    pub tag: Option<String>,
}

impl PostQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            tag: None,
        }
    }

    pub fn tagged(name: impl Into<String>) -> Self {
        Self {
            search: None,
            tag: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlogApi {
    client: ApiClient,
    page_size: u32,
}

impl BlogApi {
    pub fn new(client: ApiClient, config: &ClientConfig) -> Self {
        Self {
            client,
            page_size: config.page_size,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn page_request(&self, path: &str) -> ApiRequest {
        ApiRequest::get(path)
            .query("page", 1)
            .query("page_size", self.page_size)
    }

    // ==================== Посты ====================

    pub async fn list_posts(&self, query: &PostQuery) -> Vec<Post> {
        let mut request = self.page_request("blogs/");
        if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
            request = request.query("search_term", term.trim());
        }

        let page: PostPage = match self.client.send_json(request).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Failed to fetch posts: {}", e);
                return Vec::new();
            }
        };

        // drafts without a publication date are not public
        let posts = page
            .items
            .into_iter()
            .map(Post::from)
            .filter(|p| p.status.is_published() || p.publish_date.is_some());
        match query.tag.as_deref() {
            Some(tag) => posts.filter(|p| p.has_tag(tag)).collect(),
            None => posts.collect(),
        }
    }

    pub async fn list_admin_posts(&self) -> Result<Vec<Post>, ContentError> {
        let page: PostPage = self
            .client
            .send_json(self.page_request("admin/blogs/"))
            .await?;
        Ok(page.items.into_iter().map(Post::from).collect())
    }

    pub async fn get_post(&self, slug: &str) -> Option<Post> {
        let request = ApiRequest::get(format!("blogs/{}/", slug));
        match self.client.send_json::<PostDto>(request).await {
            Ok(dto) => Some(Post::from(dto)),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                tracing::error!("Failed to fetch post {}: {}", slug, e);
                None
            }
        }
    }

    pub async fn get_admin_post(&self, id: &str) -> Option<Post> {
        let request = ApiRequest::get(format!("admin/blogs/{}/", id));
        match self.client.send_json::<PostDto>(request).await {
            Ok(dto) => Some(Post::from(dto)),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                tracing::error!("Failed to fetch admin post {}: {}", id, e);
                None
            }
        }
    }

    /// Create (no id) or update a post, resolving its tag names to ids first.
    pub async fn save_post(&self, input: &PostInput) -> Result<Post, ContentError> {
        input.validate()?;

        let names = input.tags.normalize();
        let tag_ids = self.resolve_tags(&names).await?;
        let payload = mapper::to_payload(input, tag_ids, Utc::now());

        let request = match input.id.as_deref() {
            Some(id) => ApiRequest::put(format!("admin/blogs/{}/", id)),
            None => ApiRequest::post("admin/blogs/"),
        }
        .json(&payload)?;

        match self.client.send_json::<PostDto>(request).await {
            Ok(dto) => {
                let post = Post::from(dto);
                tracing::info!("Post saved: id={}, slug={}", post.id, post.slug);
                Ok(post)
            }
            Err(ContentError::Api { status, body }) if status == reqwest::StatusCode::CONFLICT => {
                tracing::warn!("Post slug {} already exists", input.slug);
                Err(ContentError::Conflict(body))
            }
            Err(e) => {
                tracing::error!("Failed to save post {}: {}", input.slug, e);
                Err(e)
            }
        }
    }

    /// Resolve-or-create: one read of the tag list, then a create for every
    /// name without a case-insensitive match.
    ///
    /// Not guarded against a concurrent save creating the same name; a 409 on
    /// create triggers one re-read before giving up.
    async fn resolve_tags(&self, names: &[String]) -> Result<Vec<String>, ContentError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let mut known = self.list_tags().await?;
        let mut ids = Vec::with_capacity(names.len());

        for name in names {
            if let Some(tag) = known.iter().find(|t| t.matches_name(name)) {
                ids.push(tag.id.clone());
                continue;
            }

            let tag = match self.create_implicit_tag(name).await {
                Ok(tag) => tag,
                Err(e) if e.is_conflict() => {
                    tracing::debug!("Tag {} created concurrently, re-reading tags", name);
                    known = self.list_tags().await?;
                    match known.iter().find(|t| t.matches_name(name)) {
                        Some(tag) => tag.clone(),
                        None => {
                            return Err(ContentError::Conflict(format!(
                                "tag {} conflicts but cannot be found",
                                name
                            )))
                        }
                    }
                }
                Err(e) => return Err(e),
            };

            ids.push(tag.id.clone());
            if !known.iter().any(|t| t.id == tag.id) {
                known.push(tag);
            }
        }

        Ok(ids)
    }

    async fn create_implicit_tag(&self, name: &str) -> Result<Tag, ContentError> {
        let request = ApiRequest::post("admin/tags/").json(&NewTagPayload {
            name,
            color_code: IMPLICIT_TAG_COLOR,
        })?;
        let tag = Tag::from(self.client.send_json::<TagDto>(request).await?);
        tracing::info!("Tag created while saving post: {} ({})", tag.name, tag.id);
        Ok(tag)
    }

    pub async fn delete_post(&self, id: &str) -> bool {
        match self
            .client
            .send_empty(ApiRequest::delete(format!("admin/blogs/{}/", id)))
            .await
        {
            Ok(()) => {
                tracing::info!("Post deleted: id={}", id);
                true
            }
            Err(e) => {
                tracing::error!("Failed to delete post {}: {}", id, e);
                false
            }
        }
    }

    // ==================== Теги ====================

    pub async fn list_tags(&self) -> Result<Vec<Tag>, ContentError> {
        let tags: TagList = self.client.send_json(ApiRequest::get("tags/")).await?;
        Ok(tags.0.into_iter().map(Tag::from).collect())
    }

    pub async fn get_tag(&self, id: &str) -> Option<Tag> {
        let request = ApiRequest::get(format!("admin/tags/{}/", id));
        match self.client.send_json::<TagDto>(request).await {
            Ok(dto) => Some(Tag::from(dto)),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                tracing::error!("Failed to fetch tag {}: {}", id, e);
                None
            }
        }
    }

    pub async fn create_tag(&self, fields: &TagFields) -> Result<Tag, ContentError> {
        fields.validate()?;
        let request = ApiRequest::post("admin/tags/").json(fields)?;
        let tag = Tag::from(self.client.send_json::<TagDto>(request).await?);
        tracing::info!("Tag created: {} ({})", tag.name, tag.id);
        Ok(tag)
    }

    pub async fn update_tag(&self, id: &str, fields: &TagFields) -> Result<Tag, ContentError> {
        fields.validate()?;
        let request = ApiRequest::put(format!("admin/tags/{}/", id)).json(fields)?;
        let tag = Tag::from(self.client.send_json::<TagDto>(request).await?);
        tracing::info!("Tag updated: {} ({})", tag.name, tag.id);
        Ok(tag)
    }

    pub async fn delete_tag(&self, id: &str) -> bool {
        match self
            .client
            .send_empty(ApiRequest::delete(format!("admin/tags/{}/", id)))
            .await
        {
            Ok(()) => {
                tracing::info!("Tag deleted: id={}", id);
                true
            }
            Err(e) => {
                tracing::error!("Failed to delete tag {}: {}", id, e);
                false
            }
        }
    }
}
