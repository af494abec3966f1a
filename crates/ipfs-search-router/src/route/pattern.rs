//! Pattern parsing for route segments
//!
//! Pure functional parsing of URL patterns (`/search/:query`) into typed segments.
//! All functions are **pure**: same input → same output, no side effects.

/// Name given to the capture of a bare `*` segment
pub const DEFAULT_CATCH_ALL: &str = "pathMatch";

/// Represents the different kinds of route pattern segments
///
/// # Examples
///
/// ```
/// use ipfs_search_router::route::pattern::{classify_segment, PatternSegment};
///
/// assert!(matches!(classify_segment("search"), PatternSegment::Static(_)));
/// assert!(matches!(classify_segment(":query"), PatternSegment::Required(_)));
/// assert!(matches!(classify_segment(":page?"), PatternSegment::Optional(_)));
/// assert!(matches!(classify_segment("*"), PatternSegment::CatchAll(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// Literal text that must appear verbatim
    Static(String),
    /// Named parameter: `:query`
    Required(String),
    /// Named parameter that may be absent: `:page?`
    Optional(String),
    /// Remainder of the path, zero or more segments: `*` or `*rest`
    CatchAll(String),
}

impl PatternSegment {
    /// Parameter name captured by this segment, `None` for static text
    pub fn param_name(&self) -> Option<&str> {
        match self {
            PatternSegment::Static(_) => None,
            PatternSegment::Required(name)
            | PatternSegment::Optional(name)
            | PatternSegment::CatchAll(name) => Some(name),
        }
    }
}

/// Classifies a single segment into a pattern type (pure function)
///
/// # Parsing Rules (evaluated in order)
///
/// 1. **Catch-all**: `*` or `*name`
/// 2. **Optional param**: `:name?`
/// 3. **Required param**: `:name`
/// 4. **Static**: any other text
pub fn classify_segment(segment: &str) -> PatternSegment {
    if let Some(name) = segment.strip_prefix('*') {
        let name = if name.is_empty() { DEFAULT_CATCH_ALL } else { name };
        return PatternSegment::CatchAll(name.to_string());
    }

    match segment.strip_prefix(':') {
        Some(param) => match param.strip_suffix('?') {
            Some(name) => PatternSegment::Optional(name.to_string()),
            None => PatternSegment::Required(param.to_string()),
        },
        None => PatternSegment::Static(segment.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_static() {
        assert_eq!(
            classify_segment("search"),
            PatternSegment::Static("search".to_string())
        );
    }

    #[test]
    fn test_classify_required() {
        assert_eq!(
            classify_segment(":query"),
            PatternSegment::Required("query".to_string())
        );
    }

    #[test]
    fn test_classify_optional() {
        assert_eq!(
            classify_segment(":page?"),
            PatternSegment::Optional("page".to_string())
        );
    }

    #[test]
    fn test_classify_catch_all() {
        assert_eq!(
            classify_segment("*rest"),
            PatternSegment::CatchAll("rest".to_string())
        );
        assert_eq!(
            classify_segment("*"),
            PatternSegment::CatchAll(DEFAULT_CATCH_ALL.to_string())
        );
    }

    #[test]
    fn test_param_name() {
        assert_eq!(classify_segment(":query").param_name(), Some("query"));
        assert_eq!(classify_segment("search").param_name(), None);
    }
}
