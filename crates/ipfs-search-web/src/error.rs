use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use ipfs_search_router::RouteError;

use crate::views;

/// A unified error type so handlers and views can use `?`
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No route matched the requested path
    #[error("page not found: {0}")]
    NotFound(String),

    /// Request that does not make sense for its route
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Search backend or other infrastructure failure
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<RouteError> for AppError {
    fn from(err: RouteError) -> Self {
        AppError::Internal(err.into())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// HTML pages get an error page; the JSON API wraps errors itself
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(err) => {
                tracing::error!("Internal server error: {:#}", err);
                "Something went wrong".to_string()
            }
            AppError::NotFound(path) => format!("Nothing lives at '{}'", path),
            AppError::BadRequest(msg) => msg.clone(),
        };

        (status, Html(views::error_page(status, &message).into_string())).into_response()
    }
}
