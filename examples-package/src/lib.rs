//! Runnable examples for the query-remember workspace.
//!
//! See `examples/remember_query.rs`.
