//! Binding a route table to the views of a host application
//!
//! Installing is the moment a table meets its host: every route's component
//! name must resolve to a registered view, otherwise the host refuses to start.

use std::collections::HashMap;

use crate::{RouteError, RouteMatch, RouteTable};

/// A route table whose routes are bound to views of type `V`
///
/// Views are stored in route order, so resolving a path yields the view
/// without a second lookup.
#[derive(Debug, Clone)]
pub struct InstalledTable<V> {
    table: RouteTable,
    views: Vec<V>,
}

impl RouteTable {
    /// Binds every route to the view registered under its component name
    ///
    /// Several routes may share one component, so views are cloned per route;
    /// views nobody references are dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use ipfs_search_router::{Route, RouteError, RouteTable};
    /// use std::collections::HashMap;
    ///
    /// let table = RouteTable::new([Route::new("/", "Search", "Search")]).unwrap();
    ///
    /// let mut views = HashMap::new();
    /// views.insert("Search".to_string(), "search-view");
    /// let installed = table.clone().install(views).unwrap();
    /// let (route_match, view) = installed.resolve("/").unwrap();
    /// assert_eq!(route_match.name(), "Search");
    /// assert_eq!(*view, "search-view");
    ///
    /// let err = table.install(HashMap::<String, &str>::new()).unwrap_err();
    /// assert!(matches!(err, RouteError::UnboundComponent { .. }));
    /// ```
    pub fn install<V: Clone>(self, views: HashMap<String, V>) -> Result<InstalledTable<V>, RouteError> {
        let bound = self
            .routes()
            .iter()
            .map(|route| {
                views
                    .get(&route.component)
                    .cloned()
                    .ok_or_else(|| RouteError::UnboundComponent {
                        route: route.name.clone(),
                        component: route.component.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(InstalledTable {
            table: self,
            views: bound,
        })
    }
}

impl<V> InstalledTable<V> {
    /// Resolves a path to its route match and bound view
    pub fn resolve(&self, path: &str) -> Option<(RouteMatch<'_>, &V)> {
        self.table.resolve_index(path).map(|(idx, params)| {
            (
                RouteMatch {
                    route: &self.table.routes()[idx],
                    params,
                },
                &self.views[idx],
            )
        })
    }

    /// The underlying route table, for navigation and URL generation
    pub fn table(&self) -> &RouteTable {
        &self.table
    }
}
