//! Crawler: indexes objects the IPFS daemon announces
//!
//! A producer follows the daemon's event log and queues every hash announced
//! with `handleAddProvider`. A pool of workers takes hashes off the bounded
//! queue, skips the ones already parsed, expands directories back into the
//! queue, and indexes files whose media type has an extractor or is an image
//! or video. Parsed hashes are saved on shutdown and reloaded on start.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::CrawlerConfig;
use crate::ipfs::{IpfsClient, IpfsError, ObjectSource};
use crate::search::{Document, SearchIndex};

pub mod extract;
pub mod mime;

use extract::Extractors;

/// Log event announcing that the daemon provides a new object
pub const PROVIDER_EVENT: &str = "handleAddProvider";

/// Media type prefixes indexed without an extractor
const INDEX_WITHOUT_CONTENT: &[&str] = &["image/", "video/"];

/// An object waiting to be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub hash: String,
    /// Name inside the parent directory, empty for announced roots
    pub filename: String,
}

impl Job {
    pub fn new(hash: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            filename: filename.into(),
        }
    }
}

/// What parsing one object led to
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Already parsed before
    Skipped,
    /// A directory; its entries are new jobs
    Directory(Vec<Job>),
    /// No extractor and not media worth listing
    Unsupported(String),
    Indexed(Document),
}

/// Loads the set of parsed hashes; a missing file is an empty set
pub fn load_parsed(path: impl AsRef<Path>) -> Result<HashSet<String>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(HashSet::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read crawler state: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse crawler state: {:?}", path))
}

pub fn save_parsed(path: impl AsRef<Path>, parsed: &HashSet<String>) -> Result<()> {
    let path = path.as_ref();
    let mut hashes: Vec<&String> = parsed.iter().collect();
    hashes.sort();

    let content = serde_json::to_string(&hashes)?;
    fs::write(path, content).with_context(|| format!("Failed to write crawler state: {:?}", path))
}

#[derive(Clone)]
pub struct Crawler {
    source: Arc<dyn ObjectSource>,
    index: Arc<dyn SearchIndex>,
    extractors: Arc<Extractors>,
    parsed: Arc<Mutex<HashSet<String>>>,
}

impl Crawler {
    pub fn new(
        source: Arc<dyn ObjectSource>,
        index: Arc<dyn SearchIndex>,
        extractors: Extractors,
        parsed: HashSet<String>,
    ) -> Self {
        Self {
            source,
            index,
            extractors: Arc::new(extractors),
            parsed: Arc::new(Mutex::new(parsed)),
        }
    }

    /// Snapshot of the hashes parsed so far
    pub async fn parsed(&self) -> HashSet<String> {
        self.parsed.lock().await.clone()
    }

    /// Parses one object and indexes it when it qualifies
    pub async fn process(&self, job: Job) -> Result<Outcome> {
        if !self.parsed.lock().await.insert(job.hash.clone()) {
            debug!(hash = %job.hash, "Ignored");
            return Ok(Outcome::Skipped);
        }

        info!(hash = %job.hash, filename = %job.filename, "Parsing");

        let head = match self.source.cat(&job.hash, Some(mime::HEAD_BYTES)).await {
            Ok(head) => head,
            Err(IpfsError::IsDirectory) => {
                let links = self.source.ls(&job.hash).await?;
                let jobs = links
                    .into_iter()
                    .map(|link| Job::new(link.hash, link.name))
                    .collect();
                return Ok(Outcome::Directory(jobs));
            }
            Err(err) => return Err(err.into()),
        };

        let mime = mime::sniff(&head, &job.filename);
        let mut document = Document {
            hash: job.hash,
            filename: job.filename,
            mime,
            ..Default::default()
        };

        match self.extractors.find(&document.mime) {
            Some(extractor) => {
                let extracted = extractor
                    .extract(self.source.as_ref(), &document.hash, &document.mime)
                    .await?;
                extracted.apply(&mut document);
            }
            None if INDEX_WITHOUT_CONTENT
                .iter()
                .any(|prefix| document.mime.starts_with(prefix)) => {}
            None => return Ok(Outcome::Unsupported(document.mime)),
        }

        self.index.index(document.clone()).await?;
        info!(hash = %document.hash, mime = %document.mime, "Indexed");

        Ok(Outcome::Indexed(document))
    }

    /// Starts `workers` consumers on a queue of `queue_size` jobs
    pub fn start(&self, workers: usize, queue_size: usize) -> CrawlerHandle {
        let (sender, receiver) = mpsc::channel(queue_size.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let mut tasks = JoinSet::new();

        for id in 0..workers.max(1) {
            tasks.spawn(self.clone().worker(id, receiver.clone(), sender.clone()));
        }

        CrawlerHandle {
            crawler: self.clone(),
            sender,
            tasks,
        }
    }

    async fn worker(self, id: usize, receiver: Arc<Mutex<mpsc::Receiver<Job>>>, sender: mpsc::Sender<Job>) {
        loop {
            let job = receiver.lock().await.recv().await;
            let Some(job) = job else {
                break;
            };

            let hash = job.hash.clone();
            match self.process(job).await {
                Ok(Outcome::Directory(jobs)) => {
                    debug!(worker = id, hash = %hash, entries = jobs.len(), "Queued directory entries");
                    // Sent from a separate task so a full queue cannot block every worker
                    let sender = sender.clone();
                    tokio::spawn(async move {
                        for job in jobs {
                            if sender.send(job).await.is_err() {
                                break;
                            }
                        }
                    });
                }
                Ok(Outcome::Unsupported(mime)) => {
                    debug!(worker = id, hash = %hash, mime = %mime, "Not indexed");
                }
                Ok(_) => {}
                Err(err) => warn!(worker = id, hash = %hash, "Failed to parse: {:#}", err),
            }
        }
    }
}

/// Running crawler tasks
pub struct CrawlerHandle {
    crawler: Crawler,
    sender: mpsc::Sender<Job>,
    tasks: JoinSet<()>,
}

impl CrawlerHandle {
    /// Queues a job, waiting while the queue is full
    pub async fn submit(&self, job: Job) -> Result<()> {
        self.sender
            .send(job)
            .await
            .map_err(|_| anyhow::anyhow!("Crawler queue is closed"))
    }

    /// Follows the daemon's event log and queues announced objects
    pub fn follow(&mut self, ipfs: IpfsClient) {
        let sender = self.sender.clone();
        self.tasks.spawn(async move {
            if let Err(err) = follow_providers(&ipfs, sender).await {
                warn!("Stopped following the IPFS log: {:#}", err);
            }
        });
    }

    /// Cancels every task and returns the parsed set
    pub async fn shutdown(mut self) -> HashSet<String> {
        self.tasks.shutdown().await;
        self.crawler.parsed().await
    }
}

/// Queues the key of every provider event until the stream ends
pub async fn follow_providers(ipfs: &IpfsClient, sender: mpsc::Sender<Job>) -> Result<()> {
    let mut tail = ipfs.log_tail().await?;
    info!("Following the IPFS event log");

    while let Some(event) = tail.next_event().await? {
        if event.event != PROVIDER_EVENT {
            continue;
        }
        if let Some(key) = event.key {
            sender
                .send(Job::new(key, ""))
                .await
                .map_err(|_| anyhow::anyhow!("Crawler queue is closed"))?;
        }
    }

    Ok(())
}

/// Crawler wired to the IPFS daemon, with state persisted in `state_file`
pub struct RunningCrawler {
    handle: CrawlerHandle,
    state_file: PathBuf,
}

impl RunningCrawler {
    pub fn spawn(config: &CrawlerConfig, ipfs: IpfsClient, index: Arc<dyn SearchIndex>) -> Result<Self> {
        let parsed = load_parsed(&config.state_file)?;
        info!(parsed = parsed.len(), workers = config.workers, "Starting crawler");

        let crawler = Crawler::new(
            Arc::new(ipfs.clone()),
            index,
            Extractors::standard(config.max_text_bytes),
            parsed,
        );

        let mut handle = crawler.start(config.workers, config.queue_size);
        handle.follow(ipfs);

        Ok(Self {
            handle,
            state_file: PathBuf::from(&config.state_file),
        })
    }

    /// Stops the crawler and saves the parsed set
    pub async fn stop(self) -> Result<()> {
        let parsed = self.handle.shutdown().await;
        save_parsed(&self.state_file, &parsed)?;
        info!(parsed = parsed.len(), "Crawler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipfs::Link;
    use crate::search::MemoryIndex;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    enum Object {
        File(&'static [u8]),
        Dir(Vec<(&'static str, &'static str)>),
    }

    #[derive(Default)]
    struct FakeIpfs {
        objects: HashMap<&'static str, Object>,
    }

    impl FakeIpfs {
        fn file(mut self, hash: &'static str, bytes: &'static [u8]) -> Self {
            self.objects.insert(hash, Object::File(bytes));
            self
        }

        fn dir(mut self, hash: &'static str, links: Vec<(&'static str, &'static str)>) -> Self {
            self.objects.insert(hash, Object::Dir(links));
            self
        }
    }

    #[async_trait]
    impl ObjectSource for FakeIpfs {
        async fn cat(&self, hash: &str, length: Option<usize>) -> Result<Vec<u8>, IpfsError> {
            match self.objects.get(hash) {
                Some(Object::File(bytes)) => {
                    let end = length.map_or(bytes.len(), |n| n.min(bytes.len()));
                    Ok(bytes[..end].to_vec())
                }
                Some(Object::Dir(_)) => Err(IpfsError::IsDirectory),
                None => Err(IpfsError::Api {
                    status: 500,
                    message: "merkledag: not found".to_string(),
                }),
            }
        }

        async fn ls(&self, hash: &str) -> Result<Vec<Link>, IpfsError> {
            match self.objects.get(hash) {
                Some(Object::Dir(links)) => Ok(links
                    .iter()
                    .map(|(name, hash)| Link {
                        hash: hash.to_string(),
                        name: name.to_string(),
                    })
                    .collect()),
                _ => Ok(Vec::new()),
            }
        }
    }

    fn fake_ipfs() -> FakeIpfs {
        FakeIpfs::default()
            .file("QmPage", b"<html><head><title>Home</title></head><body>ipfs rocks</body></html>")
            .file("QmNotes", b"plain notes about ipfs")
            .file("QmPng", b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR")
            .file("QmBin", b"\x01\x02\0\x03")
            .dir("QmSite", vec![("index.html", "QmPage"), ("logo.png", "QmPng")])
    }

    fn crawler(index: Arc<MemoryIndex>) -> Crawler {
        Crawler::new(
            Arc::new(fake_ipfs()),
            index,
            Extractors::standard(1024),
            HashSet::new(),
        )
    }

    #[tokio::test]
    async fn test_html_is_indexed_with_title() {
        let index = Arc::new(MemoryIndex::new());
        let outcome = crawler(index.clone()).process(Job::new("QmPage", "")).await.unwrap();

        let Outcome::Indexed(document) = outcome else {
            panic!("expected an indexed document");
        };
        assert_eq!(document.mime, "text/html");
        assert_eq!(document.title, "Home");
        assert_eq!(document.text, "ipfs rocks");
        assert_eq!(index.search("rocks", 10).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_images_indexed_without_content() {
        let index = Arc::new(MemoryIndex::new());
        let outcome = crawler(index.clone())
            .process(Job::new("QmPng", "logo.png"))
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::Indexed(ref doc) if doc.mime == "image/png" && doc.text.is_empty()));
        assert_eq!(index.search("logo", 10).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_unsupported_types_are_not_indexed() {
        let index = Arc::new(MemoryIndex::new());
        let outcome = crawler(index.clone()).process(Job::new("QmBin", "")).await.unwrap();

        assert_eq!(outcome, Outcome::Unsupported("application/octet-stream".to_string()));
        assert_eq!(index.size().await, 0);
    }

    #[tokio::test]
    async fn test_directory_expands_into_jobs() {
        let index = Arc::new(MemoryIndex::new());
        let outcome = crawler(index).process(Job::new("QmSite", "")).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Directory(vec![Job::new("QmPage", "index.html"), Job::new("QmPng", "logo.png")])
        );
    }

    #[tokio::test]
    async fn test_hash_is_parsed_once() {
        let index = Arc::new(MemoryIndex::new());
        let crawler = crawler(index);

        assert!(matches!(crawler.process(Job::new("QmNotes", "")).await.unwrap(), Outcome::Indexed(_)));
        assert_eq!(crawler.process(Job::new("QmNotes", "")).await.unwrap(), Outcome::Skipped);
    }

    #[tokio::test]
    async fn test_missing_object_is_an_error_and_not_retried() {
        let index = Arc::new(MemoryIndex::new());
        let crawler = crawler(index);

        assert!(crawler.process(Job::new("QmGone", "")).await.is_err());
        assert_eq!(crawler.process(Job::new("QmGone", "")).await.unwrap(), Outcome::Skipped);
    }

    #[tokio::test]
    async fn test_workers_index_directory_contents() {
        let index = Arc::new(MemoryIndex::new());
        let handle = crawler(index.clone()).start(2, 1);

        handle.submit(Job::new("QmSite", "")).await.unwrap();

        for _ in 0..100 {
            if index.size().await == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(index.size().await, 2);

        let parsed = handle.shutdown().await;
        let expected: HashSet<String> = ["QmSite", "QmPage", "QmPng"].into_iter().map(String::from).collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_parsed_set_round_trips_through_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parsed.json");

        assert!(load_parsed(&path).unwrap().is_empty());

        let parsed: HashSet<String> = ["QmB", "QmA"].into_iter().map(String::from).collect();
        save_parsed(&path, &parsed).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), r#"["QmA","QmB"]"#);
        assert_eq!(load_parsed(&path).unwrap(), parsed);
    }

    #[test]
    fn test_corrupt_state_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parsed.json");
        fs::write(&path, "not json").unwrap();

        assert!(load_parsed(&path).is_err());
    }
}
