// File: src/config.rs
// Purpose: Configuration parsing from ipfs-search.toml with environment overrides

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "ipfs-search.toml";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub ipfs: IpfsConfig,

    #[serde(default)]
    pub crawler: CrawlerConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served under `/static`
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Whether static route segments match case-insensitively (default: true)
    #[serde(default = "default_true")]
    pub case_insensitive: bool,
}

/// Which index answers search requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process index, empty unless seeded
    #[default]
    Memory,
    /// Elasticsearch cluster
    Elasticsearch,
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "elasticsearch" | "es" => Ok(BackendKind::Elasticsearch),
            other => bail!("Unknown search backend: {}", other),
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Maximum number of hits per result page
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Public IPFS gateway that result links point to
    #[serde(default = "default_gateway")]
    pub gateway: String,

    /// JSON array of documents loaded into the memory backend at start-up
    #[serde(default)]
    pub documents: Option<String>,
}

/// Elasticsearch connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    #[serde(default = "default_es_url")]
    pub url: String,

    #[serde(default = "default_es_index")]
    pub index: String,
}

/// Start-up readiness checks against the search backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

/// IPFS daemon HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpfsConfig {
    #[serde(default = "default_ipfs_url")]
    pub url: String,

    /// Per-request timeout; the log tail stream is exempt
    #[serde(default = "default_ipfs_timeout_secs")]
    pub timeout_secs: u64,
}

/// Crawler that indexes objects announced by the IPFS daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the pending object queue
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    /// Hashes already parsed, kept across runs
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Upper bound on bytes fetched for text extraction
    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: usize,
}

// Default values
fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9000
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_limit() -> usize {
    10
}

fn default_gateway() -> String {
    "https://ipfs.io/ipfs".to_string()
}

fn default_es_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_es_index() -> String {
    "ipfs".to_string()
}

fn default_attempts() -> u32 {
    10
}

fn default_delay_secs() -> u64 {
    4
}

fn default_ipfs_url() -> String {
    "http://127.0.0.1:5001".to_string()
}

fn default_ipfs_timeout_secs() -> u64 {
    60
}

fn default_workers() -> usize {
    8
}

fn default_queue_size() -> usize {
    10
}

fn default_state_file() -> String {
    "parsed.json".to_string()
}

fn default_max_text_bytes() -> usize {
    1024 * 1024
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            case_insensitive: default_true(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            limit: default_limit(),
            gateway: default_gateway(),
            documents: None,
        }
    }
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: default_es_url(),
            index: default_es_index(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            delay_secs: default_delay_secs(),
        }
    }
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            url: default_ipfs_url(),
            timeout_secs: default_ipfs_timeout_secs(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            workers: default_workers(),
            queue_size: default_queue_size(),
            state_file: default_state_file(),
            max_text_bytes: default_max_text_bytes(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from the default path, then apply environment overrides
    pub fn load_default() -> Result<Self> {
        let mut config = Self::load(DEFAULT_CONFIG_PATH)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overrides settings from environment variables
    ///
    /// Takes a lookup function so tests do not have to touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("IPFS_SEARCH_HOST") {
            self.server.host = host;
        }

        if let Some(port) = lookup("IPFS_SEARCH_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid IPFS_SEARCH_PORT: {}", port))?;
        }

        if let Some(backend) = lookup("IPFS_SEARCH_BACKEND") {
            self.search.backend = backend.parse()?;
        }

        if let Some(url) = lookup("ELASTICSEARCH_URL") {
            self.elasticsearch.url = url;
        }

        if let Some(url) = lookup("IPFS_API_URL") {
            self.ipfs.url = url;
        }

        if let Some(enabled) = lookup("IPFS_SEARCH_CRAWLER") {
            self.crawler.enabled = enabled
                .parse()
                .with_context(|| format!("Invalid IPFS_SEARCH_CRAWLER: {}", enabled))?;
        }

        Ok(())
    }

    /// Address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.search.limit, 10);
        assert_eq!(config.search.gateway, "https://ipfs.io/ipfs");
        assert_eq!(config.search.backend, BackendKind::Memory);
        assert_eq!(config.elasticsearch.index, "ipfs");
        assert_eq!(config.retry.attempts, 10);
        assert!(config.routing.case_insensitive);
        assert_eq!(config.search.documents, None);
        assert_eq!(config.ipfs.url, "http://127.0.0.1:5001");
        assert!(!config.crawler.enabled);
        assert_eq!(config.crawler.workers, 8);
        assert_eq!(config.crawler.queue_size, 10);
    }

    #[test]
    fn test_empty_config() {
        let config = toml::from_str::<Config>("").unwrap_or_default();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.search.limit, 10);
        assert!(config.routing.case_insensitive);
    }

    #[test]
    fn test_partial_routing_section_keeps_default() {
        let config: Config = toml::from_str("[routing]\n").unwrap();
        assert!(config.routing.case_insensitive);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load("does/not/exist.toml").unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_custom_sections() {
        let toml = r#"
            [server]
            port = 8000

            [routing]
            case_insensitive = false

            [search]
            backend = "elasticsearch"
            limit = 25
            documents = "seed.json"

            [elasticsearch]
            url = "http://es:9200"

            [crawler]
            enabled = true
            workers = 2
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8000);
        assert!(!config.routing.case_insensitive);
        assert_eq!(config.search.documents.as_deref(), Some("seed.json"));
        assert!(config.crawler.enabled);
        assert_eq!(config.crawler.workers, 2);
        assert_eq!(config.crawler.queue_size, 10);
        assert_eq!(config.search.backend, BackendKind::Elasticsearch);
        assert_eq!(config.search.limit, 25);
        assert_eq!(config.elasticsearch.url, "http://es:9200");
        assert_eq!(config.elasticsearch.index, "ipfs");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("IPFS_SEARCH_PORT", "8080"),
            ("IPFS_SEARCH_BACKEND", "ES"),
            ("ELASTICSEARCH_URL", "http://search:9200"),
            ("IPFS_API_URL", "http://ipfs:5001"),
            ("IPFS_SEARCH_CRAWLER", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.search.backend, BackendKind::Elasticsearch);
        assert_eq!(config.elasticsearch.url, "http://search:9200");
        assert_eq!(config.ipfs.url, "http://ipfs:5001");
        assert!(config.crawler.enabled);
    }

    #[test]
    fn test_env_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config
            .apply_env(|key| (key == "IPFS_SEARCH_PORT").then(|| "http".to_string()))
            .is_err());
        assert!(config
            .apply_env(|key| (key == "IPFS_SEARCH_BACKEND").then(|| "solr".to_string()))
            .is_err());
        assert!(config
            .apply_env(|key| (key == "IPFS_SEARCH_CRAWLER").then(|| "yes".to_string()))
            .is_err());
    }
}
