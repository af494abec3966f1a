//! Elasticsearch search backend
//!
//! Crawled objects live in a single index; extracted text is stored in the
//! `content` field and queried with a `match` query.

use super::{Document, Hit, SearchHits, SearchIndex};
use crate::config::ElasticsearchConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Elasticsearch storage backend
#[derive(Clone)]
pub struct ElasticIndex {
    client: Client,
    config: ElasticsearchConfig,
}

impl ElasticIndex {
    pub fn new(config: &ElasticsearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create Elasticsearch client")?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Full URL of an index endpoint such as `_search`
    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.url.trim_end_matches('/'),
            self.config.index,
            action
        )
    }
}

/// Request body for a full-text search
pub(crate) fn search_body(query: &str, limit: usize) -> serde_json::Value {
    json!({
        "query": {
            "match": {
                "content": query
            }
        },
        "size": limit
    })
}

/// Stored form of a document; text lives in `content`
pub(crate) fn document_body(document: &Document) -> serde_json::Value {
    json!({
        "hash": document.hash,
        "filename": document.filename,
        "mime": document.mime,
        "title": document.title,
        "description": document.description,
        "content": document.text,
    })
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Deserialize)]
struct HitsEnvelope {
    total: Total,
    #[serde(default)]
    hits: Vec<RawHit>,
}

/// `hits.total` is a number before Elasticsearch 7 and an object since
#[derive(Deserialize)]
#[serde(untagged)]
enum Total {
    Count(u64),
    Object { value: u64 },
}

impl Total {
    fn value(&self) -> u64 {
        match self {
            Total::Count(n) | Total::Object { value: n } => *n,
        }
    }
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "_score")]
    score: Option<f64>,
    #[serde(rename = "_source")]
    source: Source,
}

#[derive(Deserialize)]
struct Source {
    hash: String,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    mime: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    content: String,
}

impl From<RawHit> for Hit {
    fn from(raw: RawHit) -> Self {
        Hit {
            document: Document {
                hash: raw.source.hash,
                filename: raw.source.filename,
                mime: raw.source.mime,
                title: raw.source.title,
                description: raw.source.description,
                text: raw.source.content,
            },
            score: raw.score.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

/// Converts a raw `_search` response body into hits
pub(crate) fn parse_search_response(body: &str) -> Result<SearchHits> {
    let response: SearchResponse =
        serde_json::from_str(body).context("Failed to parse Elasticsearch search response")?;

    Ok(SearchHits {
        total: response.hits.total.value(),
        hits: response.hits.hits.into_iter().map(Hit::from).collect(),
    })
}

#[async_trait]
impl SearchIndex for ElasticIndex {
    async fn search(&self, query: &str, limit: usize) -> Result<SearchHits> {
        let body = self
            .client
            .post(self.endpoint("_search"))
            .json(&search_body(query, limit))
            .send()
            .await
            .context("Elasticsearch search request failed")?
            .error_for_status()
            .context("Elasticsearch rejected the search request")?
            .text()
            .await
            .context("Failed to read Elasticsearch search response")?;

        parse_search_response(&body)
    }

    async fn count(&self) -> Result<u64> {
        let response: CountResponse = self
            .client
            .get(self.endpoint("_count"))
            .send()
            .await
            .context("Elasticsearch count request failed")?
            .error_for_status()
            .context("Elasticsearch rejected the count request")?
            .json()
            .await
            .context("Failed to parse Elasticsearch count response")?;

        Ok(response.count)
    }

    async fn index(&self, document: Document) -> Result<()> {
        self.client
            .put(self.endpoint(&format!("_doc/{}", document.hash)))
            .json(&document_body(&document))
            .send()
            .await
            .context("Elasticsearch index request failed")?
            .error_for_status()
            .with_context(|| format!("Elasticsearch rejected document {}", document.hash))?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "elasticsearch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_body() {
        let body = search_body("hello", 10);
        assert_eq!(body["query"]["match"]["content"], "hello");
        assert_eq!(body["size"], 10);
    }

    #[test]
    fn test_document_body_stores_text_as_content() {
        let document = Document {
            hash: "QmHash".to_string(),
            mime: "text/html".to_string(),
            title: "Hello".to_string(),
            text: "hello ipfs".to_string(),
            ..Default::default()
        };

        let body = document_body(&document);
        assert_eq!(body["content"], "hello ipfs");
        assert_eq!(body["title"], "Hello");
        assert!(body.get("text").is_none());
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let index = ElasticIndex::new(&ElasticsearchConfig {
            url: "http://localhost:9200/".to_string(),
            index: "ipfs".to_string(),
        })
        .unwrap();
        assert_eq!(index.endpoint("_search"), "http://localhost:9200/ipfs/_search");
    }

    #[test]
    fn test_parse_es7_response() {
        let body = r#"{
            "took": 3,
            "hits": {
                "total": { "value": 42, "relation": "eq" },
                "max_score": 1.5,
                "hits": [
                    {
                        "_index": "ipfs",
                        "_id": "1",
                        "_score": 1.5,
                        "_source": {
                            "hash": "QmHash",
                            "filename": "index.html",
                            "mime": "text/html",
                            "title": "Hello",
                            "content": "hello ipfs"
                        }
                    }
                ]
            }
        }"#;

        let result = parse_search_response(body).unwrap();
        assert_eq!(result.total, 42);
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].document.hash, "QmHash");
        assert_eq!(result.hits[0].document.text, "hello ipfs");
        assert_eq!(result.hits[0].score, 1.5);
    }

    #[test]
    fn test_parse_legacy_total_and_missing_fields() {
        let body = r#"{"hits": {"total": 1, "hits": [
            {"_score": null, "_source": {"hash": "QmOnlyHash", "mime": "image/png"}}
        ]}}"#;

        let result = parse_search_response(body).unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.hits[0].document.filename, "");
        assert_eq!(result.hits[0].score, 0.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_search_response("not json").is_err());
    }
}
