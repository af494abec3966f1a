//! In-memory search backend

use super::{Document, Hit, SearchHits, SearchIndex};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Field weights: filename ranks above title, title above body text
const FILENAME_WEIGHT: f64 = 1.0;
const TITLE_WEIGHT: f64 = 0.4;
const TEXT_WEIGHT: f64 = 0.2;

/// In-memory search backend
///
/// Scores documents by weighted, case-insensitive term occurrences.
/// Non-persistent; used for development and tests.
#[derive(Clone, Default)]
pub struct MemoryIndex {
    documents: Arc<RwLock<Vec<Document>>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index seeded with documents
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: Arc::new(RwLock::new(documents)),
        }
    }

    /// Create an index seeded from a JSON array of documents
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read documents file: {:?}", path))?;
        let documents: Vec<Document> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse documents file: {:?}", path))?;

        info!(count = documents.len(), "Loaded documents from {:?}", path);
        Ok(Self::with_documents(documents))
    }

    /// Add a document, replacing any previous one with the same hash
    pub async fn insert(&self, document: Document) {
        let mut documents = self.documents.write().await;
        documents.retain(|d| d.hash != document.hash);
        documents.push(document);
    }

    pub async fn size(&self) -> usize {
        self.documents.read().await.len()
    }
}

fn occurrences(haystack: &str, term: &str) -> usize {
    haystack.to_lowercase().matches(term).count()
}

fn score(document: &Document, terms: &[String]) -> f64 {
    terms
        .iter()
        .map(|term| {
            occurrences(&document.filename, term) as f64 * FILENAME_WEIGHT
                + occurrences(&document.title, term) as f64 * TITLE_WEIGHT
                + occurrences(&document.text, term) as f64 * TEXT_WEIGHT
        })
        .sum()
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn search(&self, query: &str, limit: usize) -> Result<SearchHits> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();

        if terms.is_empty() {
            return Ok(SearchHits::default());
        }

        let documents = self.documents.read().await;
        let mut hits: Vec<Hit> = documents
            .iter()
            .filter_map(|document| {
                let score = score(document, &terms);
                (score > 0.0).then(|| Hit {
                    document: document.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.document.hash.cmp(&b.document.hash))
        });

        let total = hits.len() as u64;
        hits.truncate(limit);

        Ok(SearchHits { total, hits })
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.size().await as u64)
    }

    async fn index(&self, document: Document) -> Result<()> {
        self.insert(document).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
