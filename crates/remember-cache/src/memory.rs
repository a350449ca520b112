//! In-memory cache store
//!
//! LRU-bounded store with per-entry TTL, a tag index for bulk invalidation
//! and an in-process keyed-lock registry. Suitable for single-process use
//! and as the reference implementation of [`CacheStore`].

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::RwLock;
use remember_core::{QueryResult, Result};
use tracing::debug;

use crate::lock::{KeyLock, LockRegistry};
use crate::stats::CacheStats;
use crate::store::{CacheStore, TagSet};

const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Entry stored in the cache
#[derive(Debug, Clone)]
struct StoredEntry {
    value: QueryResult,
    stored_at: Instant,
    ttl: Duration,
    tags: Vec<String>,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }
}

/// Thread-safe in-memory store with tags and keyed locks.
pub struct MemoryStore {
    entries: RwLock<LruCache<String, StoredEntry>>,
    tag_index: RwLock<HashMap<String, HashSet<String>>>,
    locks: LockRegistry,
    stats: Arc<CacheStats>,
}

impl MemoryStore {
    /// Create a store holding at most `max_entries` values.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            tag_index: RwLock::new(HashMap::new()),
            locks: LockRegistry::new(),
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Create a store with the default capacity.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }

    /// Cache statistics handle.
    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    /// Current number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Remove all entries and the tag index.
    pub fn clear(&self) {
        self.entries.write().clear();
        self.tag_index.write().clear();
        self.stats.set_entry_count(0);
    }

    /// Remove `key` from the index entry of each of its tags.
    fn detach(tag_index: &mut HashMap<String, HashSet<String>>, key: &str, tags: &[String]) {
        for tag in tags {
            if let Some(members) = tag_index.get_mut(tag) {
                members.remove(key);
                if members.is_empty() {
                    tag_index.remove(tag);
                }
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.len())
            .field("tags", &self.tag_index.read().len())
            .finish()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<QueryResult>> {
        let mut entries = self.entries.write();

        let expired = match entries.get(key) {
            Some(entry) if entry.is_expired() => true,
            Some(entry) => {
                self.stats.record_hit();
                return Ok(Some(entry.value.clone()));
            }
            None => {
                self.stats.record_miss();
                return Ok(None);
            }
        };

        if expired {
            if let Some(entry) = entries.pop(key) {
                Self::detach(&mut self.tag_index.write(), key, &entry.tags);
                self.stats.record_expiration();
            }
            self.stats.set_entry_count(entries.len() as u64);
        }
        self.stats.record_miss();
        Ok(None)
    }

    async fn put(&self, key: &str, value: QueryResult, ttl: Duration, tags: &TagSet) -> Result<()> {
        let entry = StoredEntry {
            value,
            stored_at: Instant::now(),
            ttl,
            tags: tags.iter().map(str::to_string).collect(),
        };

        let mut entries = self.entries.write();
        let mut tag_index = self.tag_index.write();

        // Replacing a key detaches its previous tags first.
        if let Some(old) = entries.peek(key) {
            let old_tags = old.tags.clone();
            Self::detach(&mut tag_index, key, &old_tags);
        }

        if let Some((evicted_key, evicted)) = entries.push(key.to_string(), entry) {
            if evicted_key != key {
                Self::detach(&mut tag_index, &evicted_key, &evicted.tags);
                self.stats.record_eviction();
            }
        }

        for tag in tags.iter() {
            tag_index
                .entry(tag.to_string())
                .or_default()
                .insert(key.to_string());
        }

        self.stats.set_entry_count(entries.len() as u64);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write();
        let removed = entries.pop(key);
        if let Some(entry) = &removed {
            Self::detach(&mut self.tag_index.write(), key, &entry.tags);
            self.stats.set_entry_count(entries.len() as u64);
        }
        Ok(removed.is_some())
    }

    fn supports_tags(&self) -> bool {
        true
    }

    async fn invalidate_tag(&self, tag: &str) -> Result<u64> {
        let mut entries = self.entries.write();
        let mut tag_index = self.tag_index.write();

        let Some(members) = tag_index.remove(tag) else {
            return Ok(0);
        };

        let mut removed = 0;
        for key in members {
            if let Some(entry) = entries.pop(&key) {
                // The entry may carry other tags; detach those too.
                let other_tags: Vec<String> =
                    entry.tags.iter().filter(|t| *t != tag).cloned().collect();
                Self::detach(&mut tag_index, &key, &other_tags);
                removed += 1;
            }
        }

        self.stats.set_entry_count(entries.len() as u64);
        debug!(tag, removed, "tag invalidated");
        Ok(removed)
    }

    async fn lock(&self, key: &str, wait: Duration) -> Result<KeyLock> {
        let acquired = self.locks.acquire(key, wait).await;
        if acquired.is_err() {
            self.stats.record_lock_timeout();
        }
        acquired
    }
}
