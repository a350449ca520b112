//! Cache backend abstraction
//!
//! [`CacheStore`] is the seam between the memoization layer and whatever
//! actually holds the entries. Tag grouping and keyed locks are optional
//! capabilities; a store that does not support them keeps the defaults.
//! [`ScopedStore`] binds a store to a tag set and provides the single
//! fetch-or-populate primitive the executor runs against.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use remember_core::{QueryResult, RememberError, Result};
use tracing::debug;

use crate::lock::KeyLock;

/// An ordered, deduplicated set of invalidation tags.
///
/// Recomputed from configuration plus the query on every request; never
/// stored as an entity of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert a tag, ignoring duplicates and empty strings.
    pub fn insert(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !tag.is_empty() && !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

impl FromIterator<String> for TagSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = Self::empty();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

/// Key-value store with per-entry TTL, optional tag grouping and an optional
/// keyed lock primitive.
///
/// A `put` replaces the whole entry and is visible on completion; partially
/// written values are never observable. No cross-process exclusivity is
/// promised by `get`/`put` themselves — losing an occasional duplicate
/// population race on the direct path is acceptable.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a cached value. Expired entries are misses.
    async fn get(&self, key: &str) -> Result<Option<QueryResult>>;

    /// Store a value under `key` with the given TTL, grouped under `tags`.
    async fn put(&self, key: &str, value: QueryResult, ttl: Duration, tags: &TagSet) -> Result<()>;

    /// Remove one entry. Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Whether this store supports tag-scoped grouping.
    fn supports_tags(&self) -> bool {
        false
    }

    /// Remove every entry grouped under `tag`. Returns the number removed.
    async fn invalidate_tag(&self, tag: &str) -> Result<u64> {
        let _ = tag;
        Err(RememberError::Cache(
            "store does not support tag invalidation".to_string(),
        ))
    }

    /// Acquire the keyed lock for `key`, waiting at most `wait`.
    ///
    /// Fails with [`RememberError::LockTimeout`] when the lock is still held
    /// after `wait`. The returned guard releases on drop.
    async fn lock(&self, key: &str, wait: Duration) -> Result<KeyLock> {
        let _ = (key, wait);
        Err(RememberError::Cache(
            "store does not support locks".to_string(),
        ))
    }
}

/// A [`CacheStore`] view bound to a tag set.
///
/// Every `put` issued through the scope is stamped with the tags; reads,
/// deletes and locks pass through unchanged. An empty tag set is the
/// untagged scope.
pub struct ScopedStore<'a> {
    store: &'a dyn CacheStore,
    tags: TagSet,
}

impl<'a> ScopedStore<'a> {
    pub fn new(store: &'a dyn CacheStore, tags: TagSet) -> Self {
        Self { store, tags }
    }

    /// The store without tag scoping.
    pub fn untagged(store: &'a dyn CacheStore) -> Self {
        Self::new(store, TagSet::empty())
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub async fn get(&self, key: &str) -> Result<Option<QueryResult>> {
        self.store.get(key).await
    }

    pub async fn put(&self, key: &str, value: QueryResult, ttl: Duration) -> Result<()> {
        self.store.put(key, value, ttl, &self.tags).await
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.store.delete(key).await
    }

    pub async fn lock(&self, key: &str, wait: Duration) -> Result<KeyLock> {
        self.store.lock(key, wait).await
    }

    /// The single fetch-or-populate primitive.
    ///
    /// Returns the cached value for `key` when present; otherwise runs
    /// `compute`, stores its result (including [`QueryResult::Empty`]) under
    /// `key` with `ttl` and the scope's tags, and returns it. A failing
    /// `compute` propagates unchanged and stores nothing.
    pub async fn remember<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<QueryResult>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<QueryResult>> + Send,
    {
        if let Some(value) = self.get(key).await? {
            debug!(key, "cache hit");
            return Ok(value);
        }

        debug!(key, "cache miss");
        let value = compute().await?;
        self.put(key, value.clone(), ttl).await?;
        debug!(key, ?ttl, "cached result");

        Ok(value)
    }
}
