//! Optional query result cache.
//!
//! Results are memoized per query shape and parameter tuple. The cache is
//! injected into a [`CachedStore`]; without one every call goes to the
//! wrapped store. It holds at most `capacity` entries and evicts the oldest
//! insertion first.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use hashbrown::HashMap;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::models::{AddressQuery, BoundingBox, PersonQuery, Record};
use crate::store::RecordStore;

/// Query shape plus its parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    ById(i64),
    Person(PersonQuery),
    Address(AddressQuery),
    /// min_lat, max_lat, min_lon, max_lon as raw bits
    BoundingBox([u64; 4]),
}

impl QueryKey {
    pub fn bbox(bbox: &BoundingBox) -> Self {
        QueryKey::BoundingBox([
            bbox.min_lat.to_bits(),
            bbox.max_lat.to_bits(),
            bbox.min_lon.to_bits(),
            bbox.max_lon.to_bits(),
        ])
    }
}

/// Entry limit used by [`QueryCache::new`]
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<QueryKey, Arc<Vec<Record>>>,
    /// Keys in insertion order, oldest at the front
    order: VecDeque<QueryKey>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

pub struct QueryCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding at most `capacity` entries (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // Entries are only ever replaced whole, so a poisoned map is still usable
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up `key`, counting the hit or miss
    pub fn get(&self, key: &QueryKey) -> Option<Arc<Vec<Record>>> {
        let mut inner = self.lock();
        match inner.entries.get(key).cloned() {
            Some(rows) => {
                inner.hits += 1;
                Some(rows)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Store `rows` under `key`, evicting the oldest entries when full
    pub fn insert(&self, key: QueryKey, rows: Vec<Record>) -> Arc<Vec<Record>> {
        let rows = Arc::new(rows);
        let mut inner = self.lock();

        if inner.entries.contains_key(&key) {
            inner.entries.insert(key, Arc::clone(&rows));
            return rows;
        }

        while inner.entries.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            inner.evictions += 1;
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(key, Arc::clone(&rows));
        rows
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries; counters are kept
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entries: inner.entries.len(),
            capacity: self.capacity,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }
}

/// Record store that consults an optional cache before delegating
pub struct CachedStore<S> {
    inner: S,
    cache: Option<Arc<QueryCache>>,
}

impl<S> CachedStore<S> {
    pub fn new(inner: S, cache: Option<Arc<QueryCache>>) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cache(&self) -> Option<&Arc<QueryCache>> {
        self.cache.as_ref()
    }
}

impl<S: RecordStore> CachedStore<S> {
    async fn cached<F, Fut>(&self, key: QueryKey, fetch: F) -> Result<Vec<Record>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Record>>>,
    {
        let Some(cache) = &self.cache else {
            return fetch().await;
        };

        if let Some(rows) = cache.get(&key) {
            debug!("Cache hit for {:?}", key);
            return Ok(rows.as_ref().clone());
        }

        // Errors propagate before anything is stored
        let rows = fetch().await?;
        cache.insert(key, rows.clone());
        Ok(rows)
    }
}

impl<S: RecordStore> RecordStore for CachedStore<S> {
    async fn by_id(&self, id: i64) -> Result<Vec<Record>> {
        self.cached(QueryKey::ById(id), || self.inner.by_id(id))
            .await
    }

    async fn by_person(&self, query: &PersonQuery) -> Result<Vec<Record>> {
        self.cached(QueryKey::Person(query.clone()), || {
            self.inner.by_person(query)
        })
        .await
    }

    async fn by_address(&self, query: &AddressQuery) -> Result<Vec<Record>> {
        self.cached(QueryKey::Address(query.clone()), || {
            self.inner.by_address(query)
        })
        .await
    }

    async fn in_bbox(&self, bbox: &BoundingBox) -> Result<Vec<Record>> {
        self.cached(QueryKey::bbox(bbox), || self.inner.in_bbox(bbox))
            .await
    }
}
