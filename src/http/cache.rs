//! `ETag` generation and conditional request checks for served files

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Cache-Control value attached to served asset files
pub const ASSET_CACHE_CONTROL: &str = "public, max-age=3600";

/// Generate a weak `ETag` from file content, e.g. `W/"1f3a9c"`
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("W/\"{:x}-{:x}\"", content.len(), hasher.finish())
}

/// Whether the client's `If-None-Match` header already names this `ETag`
///
/// Uses weak comparison: `W/"x"` and `"x"` are the same validator. Handles
/// comma-separated lists and `*`.
pub fn etag_matches(if_none_match: Option<&str>, etag: &str) -> bool {
    let ours = strip_weak(etag);
    if_none_match.is_some_and(|header| {
        header.split(',').map(str::trim).any(|candidate| {
            candidate == "*" || strip_weak(candidate) == ours
        })
    })
}

fn strip_weak(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}
