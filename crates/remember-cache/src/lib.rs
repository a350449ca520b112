//! Cache backend for the query-remember memoization layer
//!
//! This crate holds the seam between the memoizing executor and the store
//! that actually keeps the entries:
//!
//! - **`CacheStore`**: key-value-with-TTL trait with optional tag grouping
//!   and an optional keyed-lock primitive
//! - **`ScopedStore`**: a store view bound to a tag set, providing the
//!   single fetch-or-populate `remember()` primitive
//! - **`MemoryStore`**: LRU-bounded in-memory implementation with a tag
//!   index and in-process keyed locks
//! - **`LockRegistry`** / **`KeyLock`**: bounded lock acquisition for
//!   stampede protection
//! - **`CacheStats`**: hit/miss/eviction/expiration counters
//!
//! # Example
//!
//! ```ignore
//! use remember_cache::{CacheStore, MemoryStore, ScopedStore, TagSet};
//!
//! let store = MemoryStore::with_defaults();
//! let scoped = ScopedStore::new(&store, tags);
//!
//! let value = scoped
//!     .remember(&key, ttl, || async { engine.invoke("get", &[]).await })
//!     .await?;
//! ```

pub mod lock;
pub mod memory;
pub mod stats;
pub mod store;

pub use lock::{KeyLock, LockRegistry};
pub use memory::MemoryStore;
pub use stats::CacheStats;
pub use store::{CacheStore, ScopedStore, TagSet};
