//! Results view: hits for the `query` prop

use maud::{html, Markup};
use tracing::debug;

use super::{layout, search_form, ViewContext};
use crate::error::AppError;
use crate::search::Hit;

const SNIPPET_CHARS: usize = 280;

pub async fn render(ctx: ViewContext) -> Result<Markup, AppError> {
    let query = ctx
        .prop("query")
        .ok_or_else(|| AppError::BadRequest("missing search query".to_string()))?;

    let result = ctx.index.search(query, ctx.search.limit).await?;
    debug!(query, total = result.total, shown = result.hits.len(), "Rendered results");

    let gateway = ctx.search.gateway.trim_end_matches('/');

    Ok(layout(
        query,
        html! {
            a.home href="/" { "IPFS Search" }
            (search_form(Some(query)))
            @if result.hits.is_empty() {
                p.empty { "No results for " strong { (query) } }
            } @else {
                p.total { (result.total) " results" }
                ol.results {
                    @for hit in &result.hits {
                        li {
                            a href={ (gateway) "/" (hit.document.hash) } { (label(hit)) }
                            @if !hit.document.mime.is_empty() {
                                " " span.mime { (hit.document.mime) }
                            }
                            p.snippet { (snippet(summary(hit))) }
                        }
                    }
                }
            }
        },
    ))
}

/// Title, else filename, else hash
fn label(hit: &Hit) -> &str {
    let doc = &hit.document;
    [&doc.title, &doc.filename, &doc.hash]
        .into_iter()
        .find(|s| !s.trim().is_empty())
        .map(String::as_str)
        .unwrap_or_default()
}

/// Description when the page has one, else its text
fn summary(hit: &Hit) -> &str {
    let doc = &hit.document;
    if doc.description.trim().is_empty() {
        &doc.text
    } else {
        &doc.description
    }
}

fn snippet(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= SNIPPET_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(SNIPPET_CHARS).collect();
    format!("{}…", cut.trim_end())
}
