//! Content access layer for the blog API.
//!
//! ```text
//! consumer ─► query (cache, dedupe) ─► blog_api ─► http_client (auth, 401) ─► API
//!                                         ▲
//!                                       mapper
//! ```

pub mod auth;
pub mod blog_api;
pub mod config;
pub mod dto;
pub mod error;
pub mod http_client;
pub mod mapper;
pub mod models;
pub mod query;
pub mod session;

pub use auth::{AuthService, Credentials};
pub use blog_api::{BlogApi, PostQuery};
pub use config::ClientConfig;
pub use error::ContentError;
pub use http_client::{ApiClient, ApiRequest};
pub use models::{Post, PostInput, PostStatus, Tag, TagFields, TagNames};
pub use query::{BlogQueries, QueryKey, QueryObserver, QueryState};
pub use session::{AuthSession, SessionStore};

/// Everything wired together around one session store.
#[derive(Clone)]
pub struct BlogContent {
    config: ClientConfig,
    session: SessionStore,
    auth: AuthService,
    queries: BlogQueries,
}

impl BlogContent {
    pub fn new(config: ClientConfig) -> Result<Self, ContentError> {
        Self::with_session(config, SessionStore::new())
    }

    pub fn with_session(config: ClientConfig, session: SessionStore) -> Result<Self, ContentError> {
        config.validate()?;

        let client = ApiClient::new(&config, session.clone());
        let auth = AuthService::new(client.clone());
        let queries = BlogQueries::new(BlogApi::new(client, &config), &config);

        tracing::debug!("Blog content client created for {}", config.base_url);

        Ok(Self {
            config,
            session,
            auth,
            queries,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn queries(&self) -> &BlogQueries {
        &self.queries
    }

    pub fn api(&self) -> &BlogApi {
        self.queries.api()
    }

    pub fn observer<T>(&self) -> QueryObserver<T>
    where
        T: query::FromQueryData + Clone,
    {
        QueryObserver::new(self.queries.clone())
    }
}
