//! Views bound to the route table, rendered with maud

use axum::http::StatusCode;
use ipfs_search_router::Params;
use maud::{html, Markup, DOCTYPE};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::SearchConfig;
use crate::error::AppError;
use crate::routes::{RESULTS, SEARCH, SEARCH_FORM_PATH, STATIC_PATH};
use crate::search::SearchIndex;

pub mod results;
pub mod search;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Type-erased async view
pub type ViewFn = Arc<dyn Fn(ViewContext) -> BoxFuture<'static, Result<Markup, AppError>> + Send + Sync>;

/// Everything a view gets to render one request
#[derive(Clone)]
pub struct ViewContext {
    /// Request path as received
    pub path: String,
    /// Input properties, filled from path parameters when the route forwards them
    pub props: Params,
    pub index: Arc<dyn SearchIndex>,
    pub search: SearchConfig,
}

impl ViewContext {
    pub fn prop(&self, name: &str) -> Option<&str> {
        self.props.get(name).map(String::as_str)
    }
}

/// Wraps an async fn as a [`ViewFn`]
pub fn view<F, Fut>(render: F) -> ViewFn
where
    F: Fn(ViewContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Markup, AppError>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(render(ctx)))
}

/// Views by component name
pub fn registry() -> HashMap<String, ViewFn> {
    let mut views = HashMap::new();
    views.insert(SEARCH.to_string(), view(search::render));
    views.insert(RESULTS.to_string(), view(results::render));
    views
}

/// Page shell shared by every view
pub fn layout(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " · IPFS Search" }
                link rel="stylesheet" href={ (STATIC_PATH) "/style.css" };
            }
            body {
                main { (body) }
            }
        }
    }
}

/// Search box, optionally prefilled
pub fn search_form(query: Option<&str>) -> Markup {
    html! {
        form.search action=(SEARCH_FORM_PATH) method="get" {
            input type="search" name="q" value=[query] placeholder="Search IPFS" autofocus;
            button type="submit" { "Search" }
        }
    }
}

pub fn error_page(status: StatusCode, message: &str) -> Markup {
    let title = status.canonical_reason().unwrap_or("Error");
    layout(
        title,
        html! {
            h1 { (status.as_u16()) " " (title) }
            p { (message) }
            a href="/" { "Go Home" }
        },
    )
}
