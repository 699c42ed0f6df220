//! Cache key definitions

use std::fmt;

use crate::blog_api::PostQuery;

/// Resource kind a key belongs to, used for group invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Posts,
    Post,
    AdminPosts,
    AdminPost,
    Tags,
    AdminTags,
    Tag,
}

impl ResourceKind {
    /// Kinds whose cached values carry posts (and so denormalized tag names).
    pub fn holds_posts(&self) -> bool {
        matches!(
            self,
            ResourceKind::Posts | ResourceKind::Post | ResourceKind::AdminPosts | ResourceKind::AdminPost
        )
    }
}

/// Identifies one cached query: resource kind plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Public post list
    Posts(PostQuery),
    /// Public single post by slug
    Post(String),
    /// Admin post list
    AdminPosts,
    /// Admin single post by id
    AdminPost(String),
    /// All tags, for pickers and public views
    Tags,
    /// All tags, for the tag management screen
    AdminTags,
    /// Single tag by id
    Tag(String),
}

impl QueryKey {
    pub fn posts(search: Option<&str>, tag: Option<&str>) -> Self {
        QueryKey::Posts(PostQuery {
            search: search.map(str::to_string),
            tag: tag.map(str::to_string),
        })
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            QueryKey::Posts(_) => ResourceKind::Posts,
            QueryKey::Post(_) => ResourceKind::Post,
            QueryKey::AdminPosts => ResourceKind::AdminPosts,
            QueryKey::AdminPost(_) => ResourceKind::AdminPost,
            QueryKey::Tags => ResourceKind::Tags,
            QueryKey::AdminTags => ResourceKind::AdminTags,
            QueryKey::Tag(_) => ResourceKind::Tag,
        }
    }

    /// Admin views must always show the latest state.
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            QueryKey::AdminPosts | QueryKey::AdminPost(_) | QueryKey::AdminTags | QueryKey::Tag(_)
        )
    }

    /// Single-item keys with an empty identifier never fetch.
    pub fn is_enabled(&self) -> bool {
        match self {
            QueryKey::Post(id) | QueryKey::AdminPost(id) | QueryKey::Tag(id) => {
                !id.trim().is_empty()
            }
            _ => true,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Posts(q) => write!(
                f,
                "posts(search={}, tag={})",
                q.search.as_deref().unwrap_or("-"),
                q.tag.as_deref().unwrap_or("-")
            ),
            QueryKey::Post(slug) => write!(f, "post({})", slug),
            QueryKey::AdminPosts => write!(f, "adminPosts"),
            QueryKey::AdminPost(id) => write!(f, "adminPost({})", id),
            QueryKey::Tags => write!(f, "tags"),
            QueryKey::AdminTags => write!(f, "adminTags"),
            QueryKey::Tag(id) => write!(f, "tag({})", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_list_and_single_keys_are_distinct() {
        let list = QueryKey::posts(Some("react"), None);
        let single = QueryKey::Post("react".to_string());

        assert_ne!(list, single);
        assert_ne!(list.kind(), single.kind());
    }

    #[test]
    fn test_equal_parameters_give_equal_keys() {
        let mut keys = HashSet::new();
        keys.insert(QueryKey::posts(Some("react"), None));
        keys.insert(QueryKey::posts(Some("react"), None));
        keys.insert(QueryKey::posts(Some("react"), Some("Rust")));
        keys.insert(QueryKey::Tags);

        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_enabled() {
        assert!(!QueryKey::Post(String::new()).is_enabled());
        assert!(!QueryKey::Tag("  ".to_string()).is_enabled());
        assert!(QueryKey::Post("hello".to_string()).is_enabled());
        assert!(QueryKey::Tags.is_enabled());
    }

    #[test]
    fn test_admin_keys() {
        assert!(QueryKey::AdminTags.is_admin());
        assert!(QueryKey::AdminPosts.is_admin());
        assert!(!QueryKey::Tags.is_admin());
        assert!(!QueryKey::posts(None, None).is_admin());
        assert_ne!(QueryKey::Tags, QueryKey::AdminTags);
    }
}
