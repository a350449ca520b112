//! Memoizing query wrapper
//!
//! [`RememberedQuery`] sits in front of an unexecuted query: a terminal
//! operation invoked on the wrapper resolves the cache key, the tag set and
//! the TTL, then either returns the cached result or forwards the operation
//! to the engine and stores what comes back. With a non-zero wait budget the
//! population happens under a keyed lock so concurrent cache misses collapse
//! into a single execution.

use std::sync::Arc;
use std::time::Duration;

use remember_cache::{CacheStore, ScopedStore, TagSet};
use remember_core::{Invocation, QueryHandle, QueryResult, RememberError, Result, TerminalOp, Value};
use tracing::debug;

use crate::config::RememberConfig;
use crate::key::derive_key;
use crate::tag::derive_tags;

/// A query bound to a cache store and a memoization request.
///
/// The request parameters (TTL, explicit key, wait budget) are fixed at
/// construction and immutable for the lifetime of one memoization attempt.
/// The wrapper holds no mutable state of its own: key and tags are
/// recomputed from scratch on every call, so it is safe to clone and use
/// concurrently.
#[derive(Clone)]
pub struct RememberedQuery {
    query: Arc<dyn QueryHandle>,
    store: Arc<dyn CacheStore>,
    config: RememberConfig,
    ttl: Option<Duration>,
    key: Option<String>,
    wait: Duration,
}

impl RememberedQuery {
    /// Attach memoization to an in-progress query.
    pub fn new(
        query: Arc<dyn QueryHandle>,
        store: Arc<dyn CacheStore>,
        config: RememberConfig,
    ) -> Self {
        Self {
            query,
            store,
            config,
            ttl: None,
            key: None,
            wait: Duration::ZERO,
        }
    }

    /// Override the configured default TTL for this request.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Supply an explicit cache key, bypassing derivation. The caller then
    /// owns uniqueness: two different queries sharing this key collide.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the lock wait budget. Zero (the default) selects the direct
    /// path: no locking, execute-and-cache on miss.
    pub fn wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// The cache key this request resolves to.
    pub fn cache_key(&self) -> String {
        derive_key(
            self.key.as_deref(),
            &self.config.prefix,
            &self.query.sql(),
            &self.query.bindings(),
        )
    }

    /// The invalidation tags this request resolves to.
    pub fn cache_tags(&self) -> TagSet {
        derive_tags(self.query.as_ref(), self.config.tag.as_deref())
    }

    /// All matching rows.
    pub async fn get(&self) -> Result<QueryResult> {
        self.run(TerminalOp::Get).await
    }

    /// The first matching row.
    pub async fn first(&self) -> Result<QueryResult> {
        self.run(TerminalOp::First).await
    }

    /// The number of matching rows.
    pub async fn count(&self) -> Result<QueryResult> {
        self.run(TerminalOp::Count).await
    }

    /// Whether any row matches.
    pub async fn exists(&self) -> Result<QueryResult> {
        self.run(TerminalOp::Exists).await
    }

    /// A single column of the first matching row.
    pub async fn value(&self, column: impl Into<String>) -> Result<QueryResult> {
        self.run(TerminalOp::Value(column.into())).await
    }

    /// A single column across all matching rows.
    pub async fn pluck(&self, column: impl Into<String>) -> Result<QueryResult> {
        self.run(TerminalOp::Pluck(column.into())).await
    }

    pub async fn sum(&self, column: impl Into<String>) -> Result<QueryResult> {
        self.run(TerminalOp::Sum(column.into())).await
    }

    pub async fn avg(&self, column: impl Into<String>) -> Result<QueryResult> {
        self.run(TerminalOp::Avg(column.into())).await
    }

    pub async fn min(&self, column: impl Into<String>) -> Result<QueryResult> {
        self.run(TerminalOp::Min(column.into())).await
    }

    pub async fn max(&self, column: impl Into<String>) -> Result<QueryResult> {
        self.run(TerminalOp::Max(column.into())).await
    }

    /// Execute an enumerated terminal operation through the cache.
    pub async fn run(&self, op: TerminalOp) -> Result<QueryResult> {
        self.execute(op.name(), &op.args()).await
    }

    /// Execute an operation outside the [`TerminalOp`] enumeration.
    ///
    /// The terminal-vs-builder distinction is only knowable here from the
    /// engine's return value, so the misuse check runs after the forwarded
    /// call: a builder operation fails with [`RememberError::Misuse`], but
    /// the probing call itself has already run inside the engine. Prefer
    /// [`run`](Self::run) and [`refine`](Self::refine), which make the
    /// distinction static.
    pub async fn invoke(&self, operation: &str, args: &[Value]) -> Result<QueryResult> {
        self.execute(operation, args).await
    }

    /// Forward a builder operation, returning a new wrapper around the
    /// refined query, still bound to the same memoization request.
    ///
    /// Fails with [`RememberError::Misuse`] when the operation turns out to
    /// be terminal; its result is discarded, never cached.
    pub async fn refine(self, operation: &str, args: &[Value]) -> Result<Self> {
        match self.query.invoke(operation, args).await? {
            Invocation::Builder(next) => Ok(Self {
                query: Arc::from(next),
                ..self
            }),
            Invocation::Terminal(_) => Err(RememberError::misuse(operation)),
        }
    }

    /// Delete this request's cache entry. Returns whether one existed.
    pub async fn forget(&self) -> Result<bool> {
        self.store.delete(&self.cache_key()).await
    }

    async fn execute(&self, operation: &str, args: &[Value]) -> Result<QueryResult> {
        if !self.config.enabled {
            return self.forward(operation, args).await;
        }

        let key = self.cache_key();
        let ttl = self.ttl.unwrap_or(self.config.ttl);
        let tags = self.cache_tags();
        let scoped = if self.store.supports_tags() && !tags.is_empty() {
            ScopedStore::new(self.store.as_ref(), tags)
        } else {
            ScopedStore::untagged(self.store.as_ref())
        };

        if self.wait.is_zero() {
            return scoped
                .remember(&key, ttl, || self.forward(operation, args))
                .await;
        }

        // Locked path: one caller populates while concurrent requesters for
        // the same key block on the lock, then find the entry on re-check.
        let guard = scoped.lock(&key, self.wait).await?;
        debug!(key = %key, wait = ?self.wait, "lock acquired");
        let result = scoped
            .remember(&key, ttl, || self.forward(operation, args))
            .await;
        drop(guard);
        result
    }

    async fn forward(&self, operation: &str, args: &[Value]) -> Result<QueryResult> {
        match self.query.invoke(operation, args).await? {
            Invocation::Terminal(result) => Ok(result),
            Invocation::Builder(_) => Err(RememberError::misuse(operation)),
        }
    }
}

impl std::fmt::Debug for RememberedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RememberedQuery")
            .field("sql", &self.query.sql())
            .field("ttl", &self.ttl)
            .field("key", &self.key)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}
