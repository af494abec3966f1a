//! HTTP host: installs the route table and serves it with axum

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode, Uri},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use ipfs_search_router::InstalledTable;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::AppError;
use crate::routes::{self, API_SEARCH_PATH, RESULTS, SEARCH_FORM_PATH, STATIC_PATH};
use crate::search::SearchIndex;
use crate::views::{self, ViewContext, ViewFn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pages: Arc<InstalledTable<ViewFn>>,
    pub index: Arc<dyn SearchIndex>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Builds the route table and binds it to the registered views
    pub fn new(config: Config, index: Arc<dyn SearchIndex>) -> Result<Self> {
        let table = routes::route_table()
            .context("Invalid route table")?
            .with_case_insensitive(config.routing.case_insensitive);

        let pages = table
            .install(views::registry())
            .context("Failed to install route table")?;

        for route in pages.table().routes() {
            info!(path = %route.path, name = %route.name, "Registered route");
        }

        Ok(Self {
            pages: Arc::new(pages),
            index,
            config: Arc::new(config),
        })
    }
}

/// Assembles the axum router
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();

    Router::new()
        .route(SEARCH_FORM_PATH, get(search_form_handler))
        .route(API_SEARCH_PATH, get(api_search_handler))
        .nest_service(STATIC_PATH, ServeDir::new(static_dir))
        .fallback(page_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    q: Option<String>,
}

/// Form target: `/search?q=…` → `/search/<q>`, blank query → `/`
async fn search_form_handler(
    State(state): State<AppState>,
    Query(form): Query<SearchForm>,
) -> Result<Redirect, AppError> {
    let query = form.q.as_deref().map(str::trim).unwrap_or_default();

    if query.is_empty() {
        return Ok(Redirect::to("/"));
    }

    let url = state
        .pages
        .table()
        .url_for_params(RESULTS, &[("query", query)])?;

    Ok(Redirect::to(&url))
}

/// JSON hits for a query
async fn api_search_handler(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Response {
    match state.index.search(&query, state.config.search.limit).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => {
            tracing::error!(query = %query, "Search failed: {:#}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "search backend unavailable" })),
            )
                .into_response()
        }
    }
}

/// Resolves the path through the route table and renders the bound view
async fn page_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response, AppError> {
    if method != Method::GET && method != Method::HEAD {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }

    let path = uri.path();
    let (route_match, view) = state
        .pages
        .resolve(path)
        .ok_or_else(|| AppError::NotFound(path.to_string()))?;

    debug!(path, route = route_match.name(), "Matched route");

    let ctx = ViewContext {
        path: path.to_string(),
        props: route_match.props(),
        index: state.index.clone(),
        search: state.config.search.clone(),
    };

    let markup = view(ctx).await?;
    Ok(Html(markup.into_string()).into_response())
}
