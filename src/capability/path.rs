//! Logical path handling
//!
//! Paths are slash-separated and relative to the capability root. Empty
//! segments are dropped, so `"a//b/"` and `"a/b"` name the same record.
//! `""` and `"."` name the root.

use super::errors::{CapabilityError, CapabilityResult};

/// Split a logical path into its segments
pub fn segments(path: &str) -> CapabilityResult<Vec<&str>> {
    if is_root(path) {
        return Ok(Vec::new());
    }

    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if parts.iter().any(|s| *s == "." || *s == "..") {
        return Err(CapabilityError::InvalidPath(path.to_string()));
    }
    Ok(parts)
}

/// Canonical form of a logical path (root is `""`)
pub fn normalize(path: &str) -> CapabilityResult<String> {
    Ok(segments(path)?.join("/"))
}

/// True if the path names the root context
pub fn is_root(path: &str) -> bool {
    path.split('/').all(|s| s.is_empty() || s == ".")
}

/// Join a parent path and a key
pub fn join(parent: &str, key: &str) -> String {
    if is_root(parent) {
        key.to_string()
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), key)
    }
}

/// Split into (parent path, final key). The root has no key.
pub fn split_parent(path: &str) -> CapabilityResult<(String, String)> {
    let mut parts = segments(path)?;
    let key = parts
        .pop()
        .ok_or_else(|| CapabilityError::InvalidPath(path.to_string()))?;
    Ok((parts.join("/"), key.to_string()))
}

/// Final key of a path, or `""` for the root
pub fn key_of(path: &str) -> &str {
    path.split('/').filter(|s| !s.is_empty()).last().unwrap_or("")
}
