//! # ipfs-search router
//!
//! The route table of the ipfs-search web front end. A table is an ordered,
//! immutable list of route definitions, each binding a URL pattern to a named
//! view component:
//! - Static segments (`/about`)
//! - Named parameters (`/search/:query`)
//! - Optional parameters (`/search/:query/:page?`)
//! - Trailing catch-all (`/*`) for not-found fallbacks
//!
//! Matching walks the table in declaration order and the first match wins.
//! Captured parameters are percent-decoded; URL generation encodes them again.
//!
//! ## Path Normalization
//!
//! - Trailing slashes: `/search/hello/` → `/search/hello`
//! - Double slashes: `/search//hello` → `/search/hello`
//! - Backslashes: `\search\hello` → `/search/hello`
//!
//! ## Example
//!
//! ```
//! use ipfs_search_router::{Route, RouteTable};
//!
//! let table = RouteTable::new([
//!     Route::new("/", "Search", "Search"),
//!     Route::new("/search/:query", "Results", "Results").with_props(),
//! ])
//! .unwrap();
//!
//! let route_match = table.resolve("/search/hello").unwrap();
//! assert_eq!(route_match.name(), "Results");
//! assert_eq!(route_match.props().get("query"), Some(&"hello".to_string()));
//! ```

use std::collections::HashMap;

// ============================================================================
// Module Declarations
// ============================================================================

mod error;
mod install;
pub mod path;
pub mod route;

pub use error::RouteError;
pub use install::InstalledTable;
pub use path::{is_valid_path, normalize_path, strip_query};
pub use route::pattern::{classify_segment, PatternSegment};

/// Parameters captured from a path, keyed by parameter name
pub type Params = HashMap<String, String>;

// ============================================================================
// Core Types
// ============================================================================

/// A single route definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// URL pattern like "/search/:query"
    pub path: String,
    /// Unique name used for programmatic navigation
    pub name: String,
    /// Name of the view component rendered for this route
    pub component: String,
    /// Whether captured parameters are forwarded to the view as props
    pub props_from_params: bool,
    /// Parameter names in path order
    pub params: Vec<String>,
    segments: Vec<PatternSegment>,
}

/// Result of matching a path against a route table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The matched route
    pub route: &'a Route,
    /// Decoded parameters extracted from the path
    pub params: Params,
}

impl RouteMatch<'_> {
    /// Name of the matched route
    pub fn name(&self) -> &str {
        &self.route.name
    }

    /// Props handed to the view
    ///
    /// The captured parameters when the route forwards them, empty otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use ipfs_search_router::{Route, RouteTable};
    ///
    /// let table = RouteTable::new([
    ///     Route::new("/ipfs/:hash", "Object", "Object"),
    /// ])
    /// .unwrap();
    ///
    /// let route_match = table.resolve("/ipfs/Qm123").unwrap();
    /// assert_eq!(route_match.params.get("hash"), Some(&"Qm123".to_string()));
    /// assert!(route_match.props().is_empty());
    /// ```
    pub fn props(&self) -> Params {
        if self.route.props_from_params {
            self.params.clone()
        } else {
            Params::new()
        }
    }
}

// ============================================================================
// Route Implementation
// ============================================================================

impl Route {
    /// Declares a route binding `path` to `component` under `name`
    ///
    /// # Examples
    ///
    /// ```
    /// use ipfs_search_router::Route;
    ///
    /// let route = Route::new("/search/:query", "Results", "Results");
    /// assert_eq!(route.params, vec!["query"]);
    /// assert!(!route.props_from_params);
    /// ```
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        component: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let parsed = route::parse_pattern(&path);

        Route {
            path,
            name: name.into(),
            component: component.into(),
            props_from_params: false,
            params: parsed.params,
            segments: parsed.segments,
        }
    }

    /// Forwards captured parameters to the view as props
    pub fn with_props(mut self) -> Self {
        self.props_from_params = true;
        self
    }

    /// Typed segments of this route's pattern
    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// Matches this route against a path (case-sensitive)
    pub fn matches(&self, path: &str) -> Option<Params> {
        self.matches_with_options(path, false)
    }

    /// Matches this route against a path with options
    ///
    /// Walks pattern and path segments together. An optional parameter first
    /// tries to consume a segment and falls back to skipping it when the rest
    /// of the pattern then fails to match.
    pub fn matches_with_options(&self, path: &str, case_insensitive: bool) -> Option<Params> {
        let normalized = normalize_path(strip_query(path));
        let path_segments = path::segments(&normalized);

        match_segments(&self.segments, &path_segments, Params::new(), case_insensitive)
    }

    /// Generates a URL for this route by substituting parameters
    ///
    /// Values are percent-encoded. Optional parameters and a catch-all may be
    /// left out; a missing or empty required parameter is an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use ipfs_search_router::{Params, Route};
    ///
    /// let route = Route::new("/search/:query", "Results", "Results");
    ///
    /// let mut params = Params::new();
    /// params.insert("query".to_string(), "hello world".to_string());
    ///
    /// assert_eq!(route.generate_url(&params).unwrap(), "/search/hello%20world");
    /// assert!(route.generate_url(&Params::new()).is_err());
    /// ```
    pub fn generate_url(&self, params: &Params) -> Result<String, RouteError> {
        let parts = self
            .segments
            .iter()
            .map(|segment| match segment {
                PatternSegment::Static(text) => Ok(Some(text.clone())),
                PatternSegment::Required(name) => params
                    .get(name)
                    .filter(|value| !value.is_empty())
                    .map(|value| Some(urlencoding::encode(value).into_owned()))
                    .ok_or_else(|| RouteError::MissingParam {
                        route: self.name.clone(),
                        param: name.clone(),
                    }),
                PatternSegment::Optional(name) => Ok(params
                    .get(name)
                    .filter(|value| !value.is_empty())
                    .map(|value| urlencoding::encode(value).into_owned())),
                PatternSegment::CatchAll(name) => Ok(params
                    .get(name)
                    .filter(|value| !value.is_empty())
                    .map(|value| {
                        value
                            .split('/')
                            .filter(|s| !s.is_empty())
                            .map(|s| urlencoding::encode(s).into_owned())
                            .collect::<Vec<_>>()
                            .join("/")
                    })),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let filtered: Vec<String> = parts.into_iter().flatten().collect();

        if filtered.is_empty() {
            Ok("/".to_string())
        } else {
            Ok(format!("/{}", filtered.join("/")))
        }
    }
}

/// Decodes a captured path segment, keeping it verbatim when it is not valid UTF-8
fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

fn match_segments(
    pattern: &[PatternSegment],
    path: &[&str],
    mut params: Params,
    case_insensitive: bool,
) -> Option<Params> {
    let Some((head, rest)) = pattern.split_first() else {
        return path.is_empty().then_some(params);
    };

    match head {
        PatternSegment::CatchAll(name) => {
            let remaining = path
                .iter()
                .map(|s| decode_segment(s))
                .collect::<Vec<_>>()
                .join("/");
            params.insert(name.clone(), remaining);
            Some(params)
        }
        PatternSegment::Optional(name) => {
            if let Some((segment, path_rest)) = path.split_first() {
                let mut consumed = params.clone();
                consumed.insert(name.clone(), decode_segment(segment));
                if let Some(found) = match_segments(rest, path_rest, consumed, case_insensitive) {
                    return Some(found);
                }
            }
            match_segments(rest, path, params, case_insensitive)
        }
        PatternSegment::Required(name) => {
            let (segment, path_rest) = path.split_first()?;
            params.insert(name.clone(), decode_segment(segment));
            match_segments(rest, path_rest, params, case_insensitive)
        }
        PatternSegment::Static(text) => {
            let (segment, path_rest) = path.split_first()?;
            let same = if case_insensitive {
                text.eq_ignore_ascii_case(segment)
            } else {
                text == segment
            };
            if !same {
                return None;
            }
            match_segments(rest, path_rest, params, case_insensitive)
        }
    }
}

// ============================================================================
// Route Table
// ============================================================================

/// Ordered, immutable collection of routes
///
/// Built once at start-up. Route names are unique within a table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    named_routes: HashMap<String, usize>,
    case_insensitive: bool,
}

impl RouteTable {
    /// Builds a table from routes in matching order
    ///
    /// Fails when two routes share a name or a pattern is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use ipfs_search_router::{Route, RouteError, RouteTable};
    ///
    /// let err = RouteTable::new([
    ///     Route::new("/", "Search", "Search"),
    ///     Route::new("/find", "Search", "Search"),
    /// ])
    /// .unwrap_err();
    ///
    /// assert_eq!(err, RouteError::DuplicateName("Search".to_string()));
    /// ```
    pub fn new<I>(routes: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = Route>,
    {
        let routes: Vec<Route> = routes.into_iter().collect();
        let mut named_routes = HashMap::with_capacity(routes.len());

        for (idx, route) in routes.iter().enumerate() {
            route::validate_pattern(&route.segments).map_err(|reason| RouteError::InvalidPattern {
                path: route.path.clone(),
                reason,
            })?;

            if named_routes.insert(route.name.clone(), idx).is_some() {
                return Err(RouteError::DuplicateName(route.name.clone()));
            }
        }

        Ok(Self {
            routes,
            named_routes,
            case_insensitive: false,
        })
    }

    /// Configures case-insensitive matching of static segments
    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    /// Whether static segments match case-insensitively
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Resolves a path to the first matching route
    ///
    /// Query strings and fragments are ignored. `None` means no route matched;
    /// what to render then is up to the host.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        self.resolve_index(path)
            .map(|(idx, params)| RouteMatch {
                route: &self.routes[idx],
                params,
            })
    }

    pub(crate) fn resolve_index(&self, path: &str) -> Option<(usize, Params)> {
        self.routes.iter().enumerate().find_map(|(idx, route)| {
            route
                .matches_with_options(path, self.case_insensitive)
                .map(|params| (idx, params))
        })
    }

    /// Gets a route by its name
    pub fn route_by_name(&self, name: &str) -> Option<&Route> {
        self.named_routes.get(name).map(|&idx| &self.routes[idx])
    }

    /// Generates a URL for a named route
    ///
    /// # Examples
    ///
    /// ```
    /// use ipfs_search_router::{Params, Route, RouteTable};
    ///
    /// let table = RouteTable::new([
    ///     Route::new("/search/:query", "Results", "Results"),
    /// ])
    /// .unwrap();
    ///
    /// let mut params = Params::new();
    /// params.insert("query".to_string(), "ipfs".to_string());
    ///
    /// assert_eq!(table.url_for("Results", &params).unwrap(), "/search/ipfs");
    /// ```
    pub fn url_for(&self, name: &str, params: &Params) -> Result<String, RouteError> {
        self.route_by_name(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))?
            .generate_url(params)
    }

    /// Convenience form of [`RouteTable::url_for`] taking parameter tuples
    pub fn url_for_params(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
        let param_map: Params = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        self.url_for(name, &param_map)
    }

    /// All routes in matching order
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Number of routes in the table
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table has no routes
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
