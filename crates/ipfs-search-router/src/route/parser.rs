//! Pattern parsing and validation for routes
//!
//! Folds a URL pattern into its typed segments and checks the structural rules
//! a route table enforces before accepting a route.

use super::pattern::{classify_segment, PatternSegment};

/// Accumulator for fold-based parsing
#[derive(Default)]
struct ParseState {
    segments: Vec<PatternSegment>,
    params: Vec<String>,
}

impl ParseState {
    fn with_segment(mut self, segment: PatternSegment) -> Self {
        if let Some(name) = segment.param_name() {
            self.params.push(name.to_string());
        }
        self.segments.push(segment);
        self
    }
}

/// Result of parsing a route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPattern {
    /// Typed segments in path order
    pub segments: Vec<PatternSegment>,
    /// Parameter names in path order
    pub params: Vec<String>,
}

/// Parses a URL pattern into segments (pure function)
///
/// Empty segments are skipped, so `/`, `//` and `` all parse to the root pattern.
///
/// # Examples
///
/// ```
/// use ipfs_search_router::route::parser::parse_pattern;
///
/// let parsed = parse_pattern("/search/:query");
/// assert_eq!(parsed.segments.len(), 2);
/// assert_eq!(parsed.params, vec!["query".to_string()]);
///
/// assert!(parse_pattern("/").segments.is_empty());
/// ```
pub fn parse_pattern(pattern: &str) -> ParsedPattern {
    let state = pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(classify_segment)
        .fold(ParseState::default(), ParseState::with_segment);

    ParsedPattern {
        segments: state.segments,
        params: state.params,
    }
}

/// Checks the structural rules of a parsed pattern
///
/// - a catch-all may only be the last segment
/// - parameter names are non-empty
/// - parameter names are unique within the pattern
pub fn validate_pattern(segments: &[PatternSegment]) -> Result<(), String> {
    let last = segments.len().saturating_sub(1);
    if let Some(pos) = segments
        .iter()
        .position(|s| matches!(s, PatternSegment::CatchAll(_)))
    {
        if pos != last {
            return Err("catch-all segment must be the last segment".to_string());
        }
    }

    let params: Vec<&str> = segments.iter().filter_map(PatternSegment::param_name).collect();

    if params.iter().any(|p| p.is_empty()) {
        return Err("parameter name must not be empty".to_string());
    }

    for (i, name) in params.iter().enumerate() {
        if params[..i].contains(name) {
            return Err(format!("parameter `{}` appears more than once", name));
        }
    }

    Ok(())
}
