use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RememberError {
    #[error("remember must be the last call before query execution: [{operation}] called")]
    Misuse { operation: String },

    #[error("lock on cache key `{key}` not acquired within {wait:?}")]
    LockTimeout { key: String, wait: Duration },

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RememberError {
    /// Build a misuse error naming the offending operation.
    pub fn misuse(operation: impl Into<String>) -> Self {
        Self::Misuse {
            operation: operation.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RememberError>;
