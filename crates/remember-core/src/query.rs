//! Query-engine collaborator traits
//!
//! The memoization layer treats the query engine as an opaque collaborator:
//! an unexecuted query exposes a stable textual form, its ordered bound
//! parameters, and the resource it targets. Terminal operations execute and
//! return a [`QueryResult`]; non-terminal operations return a further
//! unexecuted query.

use async_trait::async_trait;

use crate::error::Result;
use crate::value::{Binding, QueryResult, Value};

/// Statically enumerated terminal operations.
///
/// These are the operations it is meaningful to cache: each one executes the
/// query and returns data rather than another builder. Operations outside
/// this enumeration can still be forwarded dynamically, guarded by the
/// post-hoc misuse check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalOp {
    /// All matching rows.
    Get,
    /// The first matching row.
    First,
    /// The number of matching rows.
    Count,
    /// Whether any row matches.
    Exists,
    /// A single column of the first matching row.
    Value(String),
    /// A single column across all matching rows.
    Pluck(String),
    Sum(String),
    Avg(String),
    Min(String),
    Max(String),
}

impl TerminalOp {
    /// The engine-facing operation name.
    pub fn name(&self) -> &'static str {
        match self {
            TerminalOp::Get => "get",
            TerminalOp::First => "first",
            TerminalOp::Count => "count",
            TerminalOp::Exists => "exists",
            TerminalOp::Value(_) => "value",
            TerminalOp::Pluck(_) => "pluck",
            TerminalOp::Sum(_) => "sum",
            TerminalOp::Avg(_) => "avg",
            TerminalOp::Min(_) => "min",
            TerminalOp::Max(_) => "max",
        }
    }

    /// Arguments forwarded alongside the operation name.
    pub fn args(&self) -> Vec<Value> {
        match self {
            TerminalOp::Get | TerminalOp::First | TerminalOp::Count | TerminalOp::Exists => {
                Vec::new()
            }
            TerminalOp::Value(column)
            | TerminalOp::Pluck(column)
            | TerminalOp::Sum(column)
            | TerminalOp::Avg(column)
            | TerminalOp::Min(column)
            | TerminalOp::Max(column) => vec![Value::Str(column.clone())],
        }
    }
}

/// Outcome of forwarding an operation to the engine.
pub enum Invocation {
    /// The operation executed the query and produced data.
    Terminal(QueryResult),
    /// The operation was a builder step and returned a further unexecuted
    /// query. Reaching the memoization layer with one of these is a usage
    /// error.
    Builder(Box<dyn QueryHandle>),
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Invocation::Terminal(result) => f.debug_tuple("Terminal").field(result).finish(),
            Invocation::Builder(_) => f.debug_tuple("Builder").finish(),
        }
    }
}

/// An unexecuted query owned by the engine.
///
/// Read-only to the memoization layer: the same textual form plus the same
/// bound parameter values must always denote the same semantic query.
#[async_trait]
pub trait QueryHandle: Send + Sync {
    /// The canonical textual form of the query.
    fn sql(&self) -> String;

    /// The ordered bound-parameter list.
    fn bindings(&self) -> Vec<Binding>;

    /// The target table/collection, if this query has one.
    fn table(&self) -> Option<String>;

    /// The resource descriptor backing this query, if any.
    fn descriptor(&self) -> Option<&dyn ResourceDescriptor> {
        None
    }

    /// Forward an operation to the engine.
    ///
    /// Terminal operations return [`Invocation::Terminal`]; builder
    /// operations return [`Invocation::Builder`] with the refined query.
    async fn invoke(&self, operation: &str, args: &[Value]) -> Result<Invocation>;
}

/// Capability interface for resource-supplied invalidation-tag overrides.
///
/// Resolved once per memoization attempt, replacing runtime type inspection
/// of the query-builder variants.
pub trait ResourceDescriptor: Send + Sync {
    /// Full invalidation-tag override, used verbatim when present.
    fn cache_tag(&self) -> Option<String> {
        None
    }

    /// Tag-suffix override, appended to the global tag when present.
    fn cache_tag_suffix(&self) -> Option<String> {
        None
    }
}
