//! Keyed query cache with request coalescing.
//!
//! Concurrent fetches of the same key share one in-flight future. Every key
//! carries a generation drawn from a cache-wide counter; invalidation moves
//! it forward, and a fetch that completes under an older generation is
//! handed to its waiters but never written back.
//!
//! Entries idle for longer than the GC time, with no fetch in flight, are
//! dropped whenever a new fetch starts.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use super::keys::QueryKey;
use crate::error::ContentError;

pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

/// Errors are shared between every waiter of a coalesced fetch.
pub type QueryResult<V> = Result<V, Arc<ContentError>>;

type InFlight<V> = Shared<BoxFuture<'static, QueryResult<V>>>;

struct Entry<V> {
    data: Option<V>,
    updated_at: Option<Instant>,
    generation: u64,
    invalidated: bool,
    in_flight: Option<(u64, InFlight<V>)>,
}

impl<V: Clone> Entry<V> {
    fn new(generation: u64) -> Self {
        Self {
            data: None,
            updated_at: None,
            generation,
            invalidated: false,
            in_flight: None,
        }
    }

    fn fresh(&self, stale_time: Duration) -> Option<V> {
        if self.invalidated {
            return None;
        }
        match (&self.data, self.updated_at) {
            (Some(data), Some(at)) if at.elapsed() < stale_time => Some(data.clone()),
            _ => None,
        }
    }

    fn is_collectable(&self, gc_time: Duration) -> bool {
        self.in_flight.is_none() && self.updated_at.map_or(true, |at| at.elapsed() >= gc_time)
    }
}

struct Store<V> {
    entries: HashMap<QueryKey, Entry<V>>,
    last_generation: u64,
}

impl<V: Clone> Store<V> {
    fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    fn collect_garbage(&mut self, gc_time: Duration) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_collectable(gc_time));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, "Evicted idle query cache entries");
        }
    }
}

pub struct QueryCache<V> {
    store: Mutex<Store<V>>,
    gc_time: Duration,
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_gc_time(DEFAULT_GC_TIME)
    }

    pub fn with_gc_time(gc_time: Duration) -> Self {
        Self {
            store: Mutex::new(Store {
                entries: HashMap::new(),
                last_generation: 0,
            }),
            gc_time,
        }
    }

    /// Serve `key` from cache while fresh, otherwise join the in-flight fetch
    /// or start one with `fetcher`. `force` skips the freshness check.
    pub async fn fetch<F, Fut>(
        &self,
        key: &QueryKey,
        stale_time: Duration,
        force: bool,
        fetcher: F,
    ) -> QueryResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ContentError>> + Send + 'static,
    {
        let (generation, in_flight) = {
            let mut store = self.store.lock().await;

            if !force {
                if let Some(data) = store.entries.get(key).and_then(|e| e.fresh(stale_time)) {
                    debug!(key = %key, "Query cache hit");
                    return Ok(data);
                }
            }

            let joinable = store.entries.get(key).and_then(|entry| {
                entry
                    .in_flight
                    .as_ref()
                    .filter(|(generation, _)| *generation == entry.generation)
                    .map(|(generation, fut)| (*generation, fut.clone()))
            });

            match joinable {
                Some(joined) => {
                    debug!(key = %key, "Joining in-flight query");
                    joined
                }
                None => {
                    store.collect_garbage(self.gc_time);
                    let existing = store.entries.get(key).map(|entry| entry.generation);
                    let generation = match existing {
                        Some(generation) => generation,
                        None => {
                            let generation = store.next_generation();
                            store.entries.insert(key.clone(), Entry::new(generation));
                            generation
                        }
                    };

                    debug!(key = %key, generation, "Starting query");
                    let fut = fetcher().map(|r| r.map_err(Arc::new)).boxed().shared();
                    if let Some(entry) = store.entries.get_mut(key) {
                        entry.in_flight = Some((generation, fut.clone()));
                    }
                    (generation, fut)
                }
            }
        };

        let result = in_flight.await;

        let mut store = self.store.lock().await;
        match store.entries.get_mut(key) {
            Some(entry) if entry.generation == generation => {
                if matches!(&entry.in_flight, Some((g, _)) if *g == generation) {
                    entry.in_flight = None;
                }
                if let Ok(data) = &result {
                    entry.data = Some(data.clone());
                    entry.updated_at = Some(Instant::now());
                    entry.invalidated = false;
                }
            }
            _ => debug!(key = %key, generation, "Discarding superseded query result"),
        }

        result
    }

    /// Mark every matching key stale and orphan its in-flight fetch.
    /// Returns the number of keys touched.
    pub async fn invalidate<P>(&self, predicate: P) -> usize
    where
        P: Fn(&QueryKey) -> bool,
    {
        let mut store = self.store.lock().await;
        let Store {
            entries,
            last_generation,
        } = &mut *store;

        let mut count = 0;
        for (key, entry) in entries.iter_mut().filter(|(k, _)| predicate(k)) {
            *last_generation += 1;
            entry.generation = *last_generation;
            entry.invalidated = true;
            entry.in_flight = None;
            debug!(key = %key, generation = entry.generation, "Query invalidated");
            count += 1;
        }
        count
    }

    pub async fn invalidate_key(&self, key: &QueryKey) -> usize {
        self.invalidate(|k| k == key).await
    }

    /// Last stored value for `key`, fresh or not.
    pub async fn peek(&self, key: &QueryKey) -> Option<V> {
        let store = self.store.lock().await;
        store.entries.get(key).and_then(|e| e.data.clone())
    }

    pub async fn is_stale(&self, key: &QueryKey, stale_time: Duration) -> bool {
        let store = self.store.lock().await;
        store
            .entries
            .get(key)
            .map_or(true, |e| e.fresh(stale_time).is_none())
    }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.store.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.store.lock().await.entries.clear();
    }
}

impl<V> Default for QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
