//! Route module: pure parsing of URL patterns into typed segments.

pub mod parser;
pub mod pattern;

pub use parser::{parse_pattern, validate_pattern, ParsedPattern};
pub use pattern::{classify_segment, PatternSegment};
