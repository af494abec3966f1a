//! Search view: the landing page with the search box

use maud::{html, Markup};
use tracing::warn;

use super::{layout, search_form, ViewContext};
use crate::error::AppError;

pub async fn render(ctx: ViewContext) -> Result<Markup, AppError> {
    // The landing page stays usable while the index is down
    let count = match ctx.index.count().await {
        Ok(count) => Some(count),
        Err(err) => {
            warn!(backend = ctx.index.name(), "Failed to count documents: {:#}", err);
            None
        }
    };

    Ok(layout(
        "Search",
        html! {
            h1 { "IPFS Search" }
            (search_form(None))
            @if let Some(count) = count {
                p.count { (count) " files indexed" }
            }
        },
    ))
}
