//! Memoization configuration

use std::time::Duration;

const DEFAULT_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_TAG: &str = "database";
const DEFAULT_PREFIX: &str = "database|";

/// Configuration for the memoization layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RememberConfig {
    /// Whether memoization is enabled; when false every call forwards
    /// straight to the engine
    pub enabled: bool,
    /// Default TTL applied when a wrapper carries no explicit TTL
    pub ttl: Duration,
    /// Global invalidation tag; `None` disables tagging entirely
    pub tag: Option<String>,
    /// Prefix prepended to derived cache keys
    pub prefix: String,
}

impl Default for RememberConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: DEFAULT_TTL,
            tag: Some(DEFAULT_TAG.to_string()),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl RememberConfig {
    /// Create a disabled configuration
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Set the default TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set or clear the global tag
    pub fn with_tag(mut self, tag: Option<&str>) -> Self {
        self.tag = tag.filter(|t| !t.is_empty()).map(str::to_string);
        self
    }

    /// Set the derived-key prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Enable or disable memoization
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Load configuration from `QUERY_REMEMBER_*` environment variables,
    /// falling back to the defaults for anything unset or unparsable.
    ///
    /// Recognized: `QUERY_REMEMBER_ENABLED` (`true`/`false`/`1`/`0`),
    /// `QUERY_REMEMBER_TTL` (seconds), `QUERY_REMEMBER_TAG` (empty disables
    /// tagging), `QUERY_REMEMBER_PREFIX`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(enabled) = std::env::var("QUERY_REMEMBER_ENABLED") {
            config.enabled = matches!(enabled.as_str(), "true" | "1" | "yes");
        }
        if let Some(secs) = std::env::var("QUERY_REMEMBER_TTL")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.ttl = Duration::from_secs(secs);
        }
        if let Ok(tag) = std::env::var("QUERY_REMEMBER_TAG") {
            config.tag = (!tag.is_empty()).then_some(tag);
        }
        if let Ok(prefix) = std::env::var("QUERY_REMEMBER_PREFIX") {
            config.prefix = prefix;
        }

        config
    }
}
