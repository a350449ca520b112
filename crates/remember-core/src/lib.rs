//! Core types for the query-remember memoization layer
//!
//! This crate defines the value model shared between the cache and the
//! memoizing executor, the collaborator traits the query engine implements,
//! and the error taxonomy:
//!
//! - **Values**: [`Value`], [`Binding`], [`Row`] and [`QueryResult`], the
//!   serializable shape of a terminal result (including the explicit
//!   [`QueryResult::Empty`] "no rows" sentinel)
//! - **Queries**: [`QueryHandle`] for unexecuted queries, [`TerminalOp`] for
//!   the enumerated cacheable operations, [`ResourceDescriptor`] for
//!   resource-supplied tag overrides
//! - **Errors**: [`RememberError`] with the misuse / lock-timeout / engine
//!   taxonomy, and the crate-wide [`Result`] alias

pub mod error;
pub mod query;
pub mod value;

pub use error::{RememberError, Result};
pub use query::{Invocation, QueryHandle, ResourceDescriptor, TerminalOp};
pub use value::{Binding, QueryResult, Row, Value};
