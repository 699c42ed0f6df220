use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::blog_queries::{BlogQueries, FromQueryData};
use super::keys::QueryKey;
use crate::error::ContentError;

/// Snapshot exposed to a view: `{ data, is_loading, is_error }`.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub is_error: bool,
    pub error: Option<Arc<ContentError>>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            is_error: false,
            error: None,
        }
    }
}

struct Slot<T> {
    key: Option<QueryKey>,
    state: QueryState<T>,
}

/// One view's subscription to a query whose key may change over time
/// (a search box, a paginated list).
///
/// Only the most recent `observe`/`refetch` call may update the state; an
/// older call that finishes later has its result dropped.
pub struct QueryObserver<T> {
    queries: BlogQueries,
    ticket: AtomicU64,
    slot: Mutex<Slot<T>>,
}

impl<T> QueryObserver<T>
where
    T: FromQueryData + Clone,
{
    pub fn new(queries: BlogQueries) -> Self {
        Self {
            queries,
            ticket: AtomicU64::new(0),
            slot: Mutex::new(Slot {
                key: None,
                state: QueryState::default(),
            }),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> QueryState<T> {
        self.slot().state.clone()
    }

    pub fn key(&self) -> Option<QueryKey> {
        self.slot().key.clone()
    }

    /// Switch to `key` and load it, from cache when fresh.
    pub async fn observe(&self, key: QueryKey) -> QueryState<T> {
        self.run(key, false).await
    }

    /// Reload the current key, bypassing freshness.
    pub async fn refetch(&self) -> QueryState<T> {
        match self.key() {
            Some(key) => self.run(key, true).await,
            None => self.state(),
        }
    }

    async fn run(&self, key: QueryKey, force: bool) -> QueryState<T> {
        let ticket = self.ticket.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut slot = self.slot();
            slot.key = Some(key.clone());
            slot.state.is_loading = true;
        }

        let result = self.queries.query::<T>(&key, force).await;

        if self.ticket.load(Ordering::SeqCst) != ticket {
            tracing::debug!(key = %key, "Dropping result of superseded query");
            return self.state();
        }

        let mut slot = self.slot();
        slot.state.is_loading = false;
        match result {
            Ok(data) => {
                slot.state.data = Some(data);
                slot.state.is_error = false;
                slot.state.error = None;
            }
            Err(e) => {
                slot.state.is_error = true;
                slot.state.error = Some(e);
            }
        }
        slot.state.clone()
    }
}
