//! The application route table

use ipfs_search_router::{Route, RouteError, RouteTable};

/// Route and component name of the search form
pub const SEARCH: &str = "Search";
/// Route and component name of the result list
pub const RESULTS: &str = "Results";

/// Target of the search form; redirects to the `Results` route
pub const SEARCH_FORM_PATH: &str = "/search";
/// JSON search API
pub const API_SEARCH_PATH: &str = "/api/search/:query";
/// Static assets mount point
pub const STATIC_PATH: &str = "/static";

/// Builds the navigable routes of the front end
pub fn route_table() -> Result<RouteTable, RouteError> {
    RouteTable::new([
        Route::new("/", SEARCH, SEARCH),
        Route::new("/search/:query", RESULTS, RESULTS).with_props(),
    ])
}
