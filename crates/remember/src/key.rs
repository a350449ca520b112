//! Cache key derivation
//!
//! A query's fingerprint is the digest of its textual form plus a canonical,
//! type-preserving encoding of its bound parameters. An explicit key
//! bypasses derivation entirely; the caller then owns collision semantics.

use remember_core::Binding;
use sha2::{Digest, Sha256};

/// Derive the cache key for a query.
///
/// Returns `explicit` unchanged when it is non-empty. Otherwise returns
/// `prefix` followed by the hex Sha256 of `sql | bindings`, where the
/// bindings are encoded as canonical JSON that carries both type and value
/// (so `Int(1)` and `Str("1")` never collide). Pure and deterministic.
pub fn derive_key(explicit: Option<&str>, prefix: &str, sql: &str, bindings: &[Binding]) -> String {
    if let Some(key) = explicit {
        if !key.is_empty() {
            return key.to_string();
        }
    }

    let mut hasher = Sha256::new();
    hasher.update(sql.as_bytes());
    hasher.update(b"|");
    hasher.update(encode_bindings(bindings).as_bytes());

    format!("{prefix}{}", hex::encode(hasher.finalize()))
}

/// Canonical, order-preserving encoding of the parameter list.
fn encode_bindings(bindings: &[Binding]) -> String {
    // Binding serialization has no failure modes (no map keys, non-finite
    // floats encode as null).
    serde_json::to_string(bindings).unwrap_or_default()
}
