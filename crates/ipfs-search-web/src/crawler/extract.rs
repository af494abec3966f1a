//! Content extractors keyed by media type prefix

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::ipfs::ObjectSource;
use crate::search::Document;

static TITLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

static META_DESCRIPTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<meta\s[^>]*name\s*=\s*["']description["'][^>]*>"#).unwrap()
});

static CONTENT_ATTR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)content\s*=\s*["']([^"']*)["']"#).unwrap());

static SCRIPT_STYLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>|<!--.*?-->").unwrap()
});

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Fields an extractor adds to a document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extracted {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: String,
}

impl Extracted {
    pub fn apply(self, document: &mut Document) {
        if let Some(title) = self.title {
            document.title = title;
        }
        if let Some(description) = self.description {
            document.description = description;
        }
        document.text = self.content;
    }
}

#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, source: &dyn ObjectSource, hash: &str, mime: &str) -> Result<Extracted>;
}

/// Extractors looked up by media type prefix, first registered match wins
#[derive(Clone, Default)]
pub struct Extractors {
    entries: Vec<(String, Arc<dyn Extractor>)>,
}

impl Extractors {
    pub fn new() -> Self {
        Self::default()
    }

    /// The extractors the crawler ships with
    pub fn standard(max_text_bytes: usize) -> Self {
        let mut extractors = Self::new();
        extractors.register("text", TextExtractor { max_bytes: max_text_bytes });
        extractors
    }

    pub fn register(&mut self, prefix: impl Into<String>, extractor: impl Extractor + 'static) {
        self.entries.push((prefix.into(), Arc::new(extractor)));
    }

    pub fn find(&self, mime: &str) -> Option<&dyn Extractor> {
        self.entries
            .iter()
            .find(|(prefix, _)| mime.starts_with(prefix.as_str()))
            .map(|(_, extractor)| extractor.as_ref())
    }
}

/// Plain text as is; HTML reduced to its title, meta description and visible text
pub struct TextExtractor {
    pub max_bytes: usize,
}

#[async_trait]
impl Extractor for TextExtractor {
    async fn extract(&self, source: &dyn ObjectSource, hash: &str, mime: &str) -> Result<Extracted> {
        let bytes = source.cat(hash, Some(self.max_bytes)).await?;
        let text = String::from_utf8_lossy(&bytes);

        if mime.starts_with("text/html") {
            Ok(extract_html(&text))
        } else {
            Ok(Extracted {
                content: text.trim().to_string(),
                ..Default::default()
            })
        }
    }
}

pub fn extract_html(html: &str) -> Extracted {
    let title = TITLE_REGEX
        .captures(html)
        .map(|caps| collapse_whitespace(&caps[1]))
        .filter(|title| !title.is_empty());

    let description = META_DESCRIPTION_REGEX
        .find(html)
        .and_then(|tag| CONTENT_ATTR_REGEX.captures(tag.as_str()))
        .map(|caps| collapse_whitespace(&caps[1]))
        .filter(|description| !description.is_empty());

    let body = TITLE_REGEX.replace_all(html, " ");
    let body = SCRIPT_STYLE_REGEX.replace_all(&body, " ");
    let body = TAG_REGEX.replace_all(&body, " ");

    Extracted {
        title,
        description,
        content: collapse_whitespace(&body),
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text.trim(), " ").into_owned()
}
