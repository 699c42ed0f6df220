//! Query layer: keyed, coalesced and invalidatable reads over the content
//! repository.

pub mod blog_queries;
pub mod cache;
pub mod keys;
pub mod observer;

pub use blog_queries::{BlogQueries, FromQueryData, QueryData};
pub use cache::{QueryCache, QueryResult};
pub use keys::{QueryKey, ResourceKind};
pub use observer::{QueryObserver, QueryState};
