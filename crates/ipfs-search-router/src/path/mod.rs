//! Path utilities for validation and normalization
//!
//! All functions are **pure**: given same input, always produce same output with no side effects.

use std::borrow::Cow;

/// Validates if a path is in canonical form
///
/// # Rules
///
/// - Must start with `/`
/// - Must not contain `//` or `\`
/// - Must not end with `/` (except root `/`)
///
/// # Examples
///
/// ```
/// use ipfs_search_router::path::is_valid_path;
///
/// assert!(is_valid_path("/"));
/// assert!(is_valid_path("/search/hello"));
///
/// assert!(!is_valid_path(""));
/// assert!(!is_valid_path("search")); // Missing leading /
/// assert!(!is_valid_path("/search/")); // Trailing /
/// assert!(!is_valid_path("/search//hello")); // Double //
/// ```
pub fn is_valid_path(path: &str) -> bool {
    if path.is_empty() || !path.starts_with('/') {
        return false;
    }

    if path.contains("//") || path.contains('\\') {
        return false;
    }

    path == "/" || !path.ends_with('/')
}

/// Normalize a path to canonical form
///
/// Returns `Cow::Borrowed` when input is already valid (zero allocations),
/// `Cow::Owned` when normalization was needed.
///
/// - Trailing slashes: `/search/` → `/search`
/// - Double slashes: `/search//hello` → `/search/hello`
/// - Backslashes: `\search\hello` → `/search/hello`
///
/// # Examples
///
/// ```
/// use ipfs_search_router::path::normalize_path;
/// use std::borrow::Cow;
///
/// assert!(matches!(normalize_path("/search"), Cow::Borrowed("/search")));
/// assert_eq!(normalize_path("/search/hello/"), "/search/hello");
/// assert_eq!(normalize_path("\\search\\hello"), "/search/hello");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_valid_path(path) {
        return Cow::Borrowed(path);
    }

    let normalized = path
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if normalized.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{}", normalized))
    }
}

/// Drops the query string and fragment from a request target
///
/// # Examples
///
/// ```
/// use ipfs_search_router::path::strip_query;
///
/// assert_eq!(strip_query("/search/hello?page=2"), "/search/hello");
/// assert_eq!(strip_query("/#top"), "/");
/// ```
pub fn strip_query(target: &str) -> &str {
    target
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or(target)
}

/// Splits a path into its non-empty segments
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
