use std::sync::Arc;
use std::time::Duration;

use super::cache::{QueryCache, QueryResult};
use super::keys::{QueryKey, ResourceKind};
use crate::blog_api::{BlogApi, PostQuery};
use crate::config::ClientConfig;
use crate::error::ContentError;
use crate::models::{Post, PostInput, Tag, TagFields};

/// Value stored under a [`QueryKey`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    Posts(Vec<Post>),
    Post(Option<Post>),
    Tags(Vec<Tag>),
    Tag(Option<Tag>),
}

impl QueryData {
    /// What a disabled key resolves to.
    fn empty_for(key: &QueryKey) -> Self {
        match key.kind() {
            ResourceKind::Posts | ResourceKind::AdminPosts => QueryData::Posts(Vec::new()),
            ResourceKind::Post | ResourceKind::AdminPost => QueryData::Post(None),
            ResourceKind::Tags | ResourceKind::AdminTags => QueryData::Tags(Vec::new()),
            ResourceKind::Tag => QueryData::Tag(None),
        }
    }
}

/// Typed view over [`QueryData`].
pub trait FromQueryData: Sized {
    fn from_query_data(data: QueryData) -> Option<Self>;
}

impl FromQueryData for Vec<Post> {
    fn from_query_data(data: QueryData) -> Option<Self> {
        match data {
            QueryData::Posts(posts) => Some(posts),
            _ => None,
        }
    }
}

impl FromQueryData for Option<Post> {
    fn from_query_data(data: QueryData) -> Option<Self> {
        match data {
            QueryData::Post(post) => Some(post),
            _ => None,
        }
    }
}

impl FromQueryData for Vec<Tag> {
    fn from_query_data(data: QueryData) -> Option<Self> {
        match data {
            QueryData::Tags(tags) => Some(tags),
            _ => None,
        }
    }
}

impl FromQueryData for Option<Tag> {
    fn from_query_data(data: QueryData) -> Option<Self> {
        match data {
            QueryData::Tag(tag) => Some(tag),
            _ => None,
        }
    }
}

/// Cached reads and cache-invalidating writes over [`BlogApi`].
///
/// Mutations go through here so every key whose result they may change is
/// invalidated; the next read of such a key refetches.
#[derive(Clone)]
pub struct BlogQueries {
    api: BlogApi,
    cache: Arc<QueryCache<QueryData>>,
    public_stale_time: Duration,
}

impl BlogQueries {
    pub fn new(api: BlogApi, config: &ClientConfig) -> Self {
        Self {
            api,
            cache: Arc::new(QueryCache::with_gc_time(config.cache_gc_time)),
            public_stale_time: config.public_stale_time,
        }
    }

    pub fn api(&self) -> &BlogApi {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache<QueryData> {
        &self.cache
    }

    /// Admin keys are never fresh; public keys use the configured window.
    pub fn stale_time(&self, key: &QueryKey) -> Duration {
        if key.is_admin() {
            Duration::ZERO
        } else {
            self.public_stale_time
        }
    }

    pub async fn fetch(&self, key: &QueryKey, force: bool) -> QueryResult<QueryData> {
        if !key.is_enabled() {
            return Ok(QueryData::empty_for(key));
        }

        let api = self.api.clone();
        let target = key.clone();
        self.cache
            .fetch(key, self.stale_time(key), force, move || async move {
                load(&api, &target).await
            })
            .await
    }

    pub async fn query<T: FromQueryData>(&self, key: &QueryKey, force: bool) -> QueryResult<T> {
        let data = self.fetch(key, force).await?;
        T::from_query_data(data).ok_or_else(|| {
            Arc::new(ContentError::InvalidRequest(format!(
                "query {} returned data of another type",
                key
            )))
        })
    }

    // ==================== Чтение ====================

    pub async fn posts(&self, query: &PostQuery) -> QueryResult<Vec<Post>> {
        self.query(&QueryKey::Posts(query.clone()), false).await
    }

    pub async fn post(&self, slug: &str) -> QueryResult<Option<Post>> {
        self.query(&QueryKey::Post(slug.to_string()), false).await
    }

    pub async fn admin_posts(&self) -> QueryResult<Vec<Post>> {
        self.query(&QueryKey::AdminPosts, false).await
    }

    pub async fn admin_post(&self, id: &str) -> QueryResult<Option<Post>> {
        self.query(&QueryKey::AdminPost(id.to_string()), false).await
    }

    pub async fn tags(&self) -> QueryResult<Vec<Tag>> {
        self.query(&QueryKey::Tags, false).await
    }

    /// Tag list for management views; never served from cache.
    pub async fn admin_tags(&self) -> QueryResult<Vec<Tag>> {
        self.query(&QueryKey::AdminTags, false).await
    }

    pub async fn tag(&self, id: &str) -> QueryResult<Option<Tag>> {
        self.query(&QueryKey::Tag(id.to_string()), false).await
    }

    // ==================== Изменения ====================

    pub async fn save_post(&self, input: &PostInput) -> Result<Post, ContentError> {
        let result = self.api.save_post(input).await;

        // tag resolution may have created tags even if the save itself failed
        self.cache
            .invalidate(|key| matches!(key, QueryKey::Tags | QueryKey::AdminTags))
            .await;

        if let Ok(post) = &result {
            let slugs = [input.slug.as_str(), post.slug.as_str()];
            // an update may have renamed the slug, and the old one is unknown here
            let is_update = input.id.is_some();
            let id = post.id.clone();
            self.cache
                .invalidate(|key| match key {
                    QueryKey::Posts(_) | QueryKey::AdminPosts => true,
                    QueryKey::Post(slug) => is_update || slugs.contains(&slug.as_str()),
                    QueryKey::AdminPost(post_id) => *post_id == id,
                    _ => false,
                })
                .await;
        }

        result
    }

    pub async fn delete_post(&self, id: &str) -> bool {
        let deleted = self.api.delete_post(id).await;
        if deleted {
            // slug unknown here, so every single-post view refetches
            self.cache
                .invalidate(|key| match key {
                    QueryKey::Posts(_) | QueryKey::AdminPosts | QueryKey::Post(_) => true,
                    QueryKey::AdminPost(post_id) => post_id == id,
                    _ => false,
                })
                .await;
        }
        deleted
    }

    pub async fn create_tag(&self, fields: &TagFields) -> Result<Tag, ContentError> {
        let tag = self.api.create_tag(fields).await?;
        self.invalidate_tag(&tag.id).await;
        Ok(tag)
    }

    pub async fn update_tag(&self, id: &str, fields: &TagFields) -> Result<Tag, ContentError> {
        let tag = self.api.update_tag(id, fields).await?;
        self.invalidate_tag(id).await;
        Ok(tag)
    }

    pub async fn delete_tag(&self, id: &str) -> bool {
        let deleted = self.api.delete_tag(id).await;
        if deleted {
            self.invalidate_tag(id).await;
        }
        deleted
    }

    /// Tag names are denormalized into posts, so post views refetch as well.
    async fn invalidate_tag(&self, id: &str) {
        self.cache
            .invalidate(|key| match key {
                QueryKey::Tags | QueryKey::AdminTags => true,
                QueryKey::Tag(tag_id) => tag_id == id,
                other => other.kind().holds_posts(),
            })
            .await;
    }
}

async fn load(api: &BlogApi, key: &QueryKey) -> Result<QueryData, ContentError> {
    Ok(match key {
        QueryKey::Posts(query) => QueryData::Posts(api.list_posts(query).await),
        QueryKey::Post(slug) => QueryData::Post(api.get_post(slug).await),
        QueryKey::AdminPosts => QueryData::Posts(api.list_admin_posts().await?),
        QueryKey::AdminPost(id) => QueryData::Post(api.get_admin_post(id).await),
        QueryKey::Tags | QueryKey::AdminTags => QueryData::Tags(api.list_tags().await?),
        QueryKey::Tag(id) => QueryData::Tag(api.get_tag(id).await),
    })
}
