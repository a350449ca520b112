//! Memoization layer for query execution
//!
//! Intercepts the moment a query is about to run: a deterministic cache key
//! is derived from the query's textual form and bound parameters, and the
//! terminal operation either returns a previously cached result or executes
//! once and stores what comes back, tagged for bulk invalidation.
//!
//! # Features
//!
//! - **Deterministic fingerprinting**: Sha256 over the query text plus a
//!   type-preserving encoding of the bound parameters
//! - **Two-level tags**: a global tag over everything this layer caches,
//!   plus a per-resource tag for targeted invalidation
//! - **Stampede protection**: with a non-zero wait budget, one caller
//!   executes while concurrent cache misses for the same key block on a
//!   keyed lock and find the populated entry on re-check
//! - **Misuse detection**: attaching the wrapper before the query is fully
//!   built fails with an error naming the offending operation
//!
//! # Example
//!
//! ```ignore
//! use remember::{RememberConfig, RememberedQuery};
//! use std::time::Duration;
//!
//! let wrapped = RememberedQuery::new(query, store, RememberConfig::default())
//!     .ttl(Duration::from_secs(60))
//!     .wait(Duration::from_secs(5));
//!
//! // One execution; identical concurrent calls share the result.
//! let rows = wrapped.get().await?;
//! ```

pub mod config;
pub mod key;
pub mod query;
pub mod tag;

pub use config::RememberConfig;
pub use key::derive_key;
pub use query::RememberedQuery;
pub use tag::{derive_tags, resource_tag};

pub use remember_cache::{CacheStore, MemoryStore, ScopedStore, TagSet};
pub use remember_core::{
    Binding, Invocation, QueryHandle, QueryResult, RememberError, ResourceDescriptor, Result, Row,
    TerminalOp, Value,
};
