//! Search backends answering the Results view and the JSON API

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{BackendKind, Config};

pub mod elastic;
pub mod memory;

pub use elastic::ElasticIndex;
pub use memory::MemoryIndex;

/// A crawled IPFS object as stored in the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    /// IPFS multihash
    pub hash: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub mime: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Extracted text content, stored as `content` by the crawler
    #[serde(default, alias = "content")]
    pub text: String,
}

/// One search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    #[serde(flatten)]
    pub document: Document,
    pub score: f64,
}

/// A page of search results, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SearchHits {
    /// Number of matching documents, which may exceed `hits.len()`
    pub total: u64,
    pub hits: Vec<Hit>,
}

/// Trait for search index backends
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Best `limit` documents matching `query`
    async fn search(&self, query: &str, limit: usize) -> Result<SearchHits>;

    /// Number of indexed documents
    async fn count(&self) -> Result<u64>;

    /// Adds a document, replacing any earlier one with the same hash
    async fn index(&self, document: Document) -> Result<()>;

    /// Checks the backend is reachable
    async fn ping(&self) -> Result<()> {
        self.count().await.map(|_| ())
    }

    /// Backend name used in logs
    fn name(&self) -> &'static str;
}

/// Create a search backend from config
pub fn create_index(config: &Config) -> Result<Arc<dyn SearchIndex>> {
    match config.search.backend {
        BackendKind::Memory => {
            let index = match &config.search.documents {
                Some(path) => MemoryIndex::from_json_file(path)?,
                None => MemoryIndex::new(),
            };
            Ok(Arc::new(index))
        }
        BackendKind::Elasticsearch => {
            let index = ElasticIndex::new(&config.elasticsearch)?;
            Ok(Arc::new(index))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_default_memory_index_is_empty() {
        let index = create_index(&Config::default()).unwrap();
        assert_eq!(index.name(), "memory");
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_memory_index_seeded_from_documents_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"hash": "QmReadme", "filename": "README.md", "content": "ipfs search engine"}},
                {{"hash": "QmLogo", "filename": "logo.png", "mime": "image/png"}}
            ]"#
        )
        .unwrap();

        let mut config = Config::default();
        config.search.documents = Some(file.path().display().to_string());

        let index = create_index(&config).unwrap();
        assert_eq!(index.count().await.unwrap(), 2);

        let result = index.search("ipfs", 10).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.hits[0].document.hash, "QmReadme");
        assert_eq!(result.hits[0].document.text, "ipfs search engine");
    }

    #[test]
    fn test_missing_documents_file_is_an_error() {
        let mut config = Config::default();
        config.search.documents = Some("does/not/exist.json".to_string());
        assert!(create_index(&config).is_err());
    }
}
