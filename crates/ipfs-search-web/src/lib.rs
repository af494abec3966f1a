//! ipfs-search web front end
//!
//! Serves the search form and result pages through the application route
//! table, plus a JSON search API, on top of a pluggable search index. The
//! optional crawler fills that index from objects the IPFS daemon announces.

pub mod config;
pub mod crawler;
pub mod error;
pub mod ipfs;
pub mod retry;
pub mod routes;
pub mod search;
pub mod server;
pub mod views;

pub use config::Config;
pub use error::AppError;
pub use search::{create_index, Document, Hit, MemoryIndex, SearchHits, SearchIndex};
pub use server::{build_router, AppState};
