use anyhow::{bail, Result};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use ipfs_search_web::{build_router, AppState, Config, Document, MemoryIndex, SearchHits, SearchIndex};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;
use tower::ServiceExt;

fn doc(hash: &str, filename: &str, text: &str) -> Document {
    Document {
        hash: hash.to_string(),
        filename: filename.to_string(),
        text: text.to_string(),
        ..Default::default()
    }
}

fn test_app_with(config: Config, index: Arc<dyn SearchIndex>) -> Router {
    build_router(AppState::new(config, index).unwrap())
}

fn test_app() -> Router {
    let index = MemoryIndex::with_documents(vec![
        doc("QmCat", "cat.jpg", "a picture of a cat"),
        doc("QmDog", "dog.txt", "notes about a dog"),
        doc("QmCats", "cats.md", "cat cat cat"),
    ]);
    test_app_with(Config::default(), Arc::new(index))
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Always failing backend
struct DownIndex;

#[async_trait]
impl SearchIndex for DownIndex {
    async fn search(&self, _query: &str, _limit: usize) -> Result<SearchHits> {
        bail!("connection refused")
    }

    async fn count(&self) -> Result<u64> {
        bail!("connection refused")
    }

    async fn index(&self, _document: Document) -> Result<()> {
        bail!("connection refused")
    }

    fn name(&self) -> &'static str {
        "down"
    }
}

#[tokio::test]
async fn test_root_renders_search_page() {
    let (status, body) = get(test_app(), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("IPFS Search"));
    assert!(body.contains(r#"action="/search""#));
    assert!(body.contains("3 files indexed"));
}

#[tokio::test]
async fn test_results_page_lists_hits() {
    let (status, body) = get(test_app(), "/search/cat").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("https://ipfs.io/ipfs/QmCats"));
    assert!(body.contains("https://ipfs.io/ipfs/QmCat"));
    assert!(!body.contains("QmDog"));
    // Query is prefilled in the search box
    assert!(body.contains(r#"value="cat""#));
}

#[tokio::test]
async fn test_results_page_decodes_query() {
    let (status, body) = get(test_app(), "/search/about%20a%20dog").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"value="about a dog""#));
    assert!(body.contains("QmDog"));
}

#[tokio::test]
async fn test_results_page_without_hits() {
    let (status, body) = get(test_app(), "/search/unicorn").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No results for"));
}

#[tokio::test]
async fn test_results_respect_limit() {
    let documents = (0..25)
        .map(|i| doc(&format!("Qm{:02}", i), "cat.txt", "cat"))
        .collect();
    let mut config = Config::default();
    config.search.limit = 5;
    let app = test_app_with(config, Arc::new(MemoryIndex::with_documents(documents)));

    let (status, body) = get(app, "/search/cat").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("25 results"));
    assert_eq!(body.matches("<li>").count(), 5);
}

#[rstest]
#[case("/search?q=cat", "/search/cat")]
#[case("/search?q=a%20b", "/search/a%20b")]
#[case("/search?q=++cat+pictures++", "/search/cat%20pictures")]
#[case("/search?q=a%2Fb", "/search/a%2Fb")]
#[case("/search?q=", "/")]
#[case("/search?q=+++", "/")]
#[case("/search", "/")]
#[tokio::test]
async fn test_search_form_redirects(#[case] uri: &str, #[case] location: &str) {
    let response = test_app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], location);
}

#[rstest]
#[case("/about")]
#[case("/search/a/b")]
#[case("/results/cat")]
#[tokio::test]
async fn test_unmatched_paths_are_not_found(#[case] uri: &str) {
    let (status, body) = get(test_app(), uri).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("404 Not Found"));
}

#[rstest]
#[case("/Search/cat")]
#[case("/SEARCH/cat")]
#[tokio::test]
async fn test_routes_ignore_case_by_default(#[case] uri: &str) {
    let (status, body) = get(test_app(), uri).await;

    assert_eq!(status, StatusCode::OK);
    // The query keeps its case
    assert!(body.contains(r#"value="cat""#));
    assert!(body.contains("QmCats"));
}

#[tokio::test]
async fn test_case_sensitive_routing_is_opt_in() {
    let mut config = Config::default();
    config.routing.case_insensitive = false;
    let app = test_app_with(config, Arc::new(MemoryIndex::new()));

    let (status, _) = get(app.clone(), "/Search/cat").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(app, "/search/cat").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_static_assets_are_served() {
    let mut config = Config::default();
    config.server.static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string();
    let app = test_app_with(config, Arc::new(MemoryIndex::new()));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/static/style.css").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/css"));

    let (status, _) = get(app, "/static/missing.css").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_to_page_is_rejected() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_api_returns_json_hits() {
    let (status, body) = get(test_app(), "/api/search/dog").await;

    assert_eq!(status, StatusCode::OK);
    let result: SearchHits = serde_json::from_str(&body).unwrap();
    assert_eq!(result.total, 1);
    assert_eq!(result.hits[0].document.hash, "QmDog");
    assert_eq!(result.hits[0].document.filename, "dog.txt");
}

#[tokio::test]
async fn test_backend_down() {
    let app = test_app_with(Config::default(), Arc::new(DownIndex));

    // Landing page still renders, without a count
    let (status, body) = get(app.clone(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("files indexed"));

    let (status, body) = get(app.clone(), "/search/cat").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Something went wrong"));
    assert!(!body.contains("connection refused"));

    let (status, body) = get(app, "/api/search/cat").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(error["error"].is_string());
}
