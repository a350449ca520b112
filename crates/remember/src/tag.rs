//! Invalidation tag derivation
//!
//! Two-level tags: a global tag covering every entry cached by this layer,
//! and a resource tag scoping one table/collection. Invalidating the global
//! tag clears everything; invalidating a resource tag clears one resource
//! without tracking individual keys.

use remember_cache::TagSet;
use remember_core::QueryHandle;

/// The resource-level tag for `resource` under `global`.
pub fn resource_tag(global: &str, resource: &str) -> String {
    format!("{global}|{resource}")
}

/// Derive the tag set for a query.
///
/// Returns the empty set when `global` is unset or empty (tagging disabled).
/// The resource tag resolves in order: descriptor full override verbatim,
/// descriptor suffix appended to the global tag, the query's target table.
/// Raw queries without a resolvable resource carry only the global tag.
pub fn derive_tags(query: &dyn QueryHandle, global: Option<&str>) -> TagSet {
    let Some(global) = global.filter(|tag| !tag.is_empty()) else {
        return TagSet::empty();
    };

    let mut tags = TagSet::empty();
    tags.insert(global);
    if let Some(resource) = resolve_resource_tag(query, global) {
        tags.insert(resource);
    }
    tags
}

fn resolve_resource_tag(query: &dyn QueryHandle, global: &str) -> Option<String> {
    if let Some(descriptor) = query.descriptor() {
        if let Some(tag) = descriptor.cache_tag().filter(|t| !t.is_empty()) {
            return Some(tag);
        }
        if let Some(suffix) = descriptor.cache_tag_suffix().filter(|s| !s.is_empty()) {
            return Some(resource_tag(global, &suffix));
        }
    }

    query
        .table()
        .filter(|table| !table.is_empty())
        .map(|table| resource_tag(global, &table))
}
