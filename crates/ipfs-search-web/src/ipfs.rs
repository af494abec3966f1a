//! Client for the IPFS daemon HTTP API (`/api/v0`)

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::IpfsConfig;

/// Error message the daemon returns when `cat` is pointed at a directory
const DIRECTORY_MESSAGE: &str = "this dag node is a directory";

#[derive(Debug, thiserror::Error)]
pub enum IpfsError {
    #[error("object is a directory")]
    IsDirectory,

    #[error("IPFS API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("IPFS request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid IPFS response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Link {
    #[serde(rename = "Hash")]
    pub hash: String,
    #[serde(rename = "Name", default)]
    pub name: String,
}

/// One line of the daemon's event log
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogEvent {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub key: Option<String>,
}

/// Where the crawler reads object content from
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Object bytes, at most `length` of them when given
    ///
    /// Fails with [`IpfsError::IsDirectory`] for directories.
    async fn cat(&self, hash: &str, length: Option<usize>) -> Result<Vec<u8>, IpfsError>;

    /// Entries of a directory
    async fn ls(&self, hash: &str) -> Result<Vec<Link>, IpfsError>;
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(rename = "Message", default)]
    message: String,
}

#[derive(Deserialize)]
struct LsResponse {
    #[serde(rename = "Objects", default)]
    objects: Vec<LsObject>,
}

#[derive(Deserialize)]
struct LsObject {
    #[serde(rename = "Links", default)]
    links: Vec<Link>,
}

#[derive(Clone)]
pub struct IpfsClient {
    client: Client,
    /// Client without a request timeout, for the endless log stream
    stream_client: Client,
    base_url: String,
}

impl IpfsClient {
    pub fn new(config: &IpfsConfig) -> Result<Self, IpfsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let stream_client = Client::builder().build()?;

        Ok(Self {
            client,
            stream_client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, command: &str) -> String {
        format!("{}/api/v0/{}", self.base_url, command)
    }

    async fn request(
        &self,
        client: &Client,
        command: &str,
        query: &[(&str, String)],
    ) -> Result<Response, IpfsError> {
        let response = client.post(self.endpoint(command)).query(query).send().await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await?;
        Err(api_error(status, &body))
    }

    /// Checks the daemon answers
    pub async fn ping(&self) -> Result<(), IpfsError> {
        self.request(&self.client, "version", &[]).await?;
        Ok(())
    }

    /// Opens the daemon's event log
    pub async fn log_tail(&self) -> Result<LogTail, IpfsError> {
        let response = self.request(&self.stream_client, "log/tail", &[]).await?;
        Ok(LogTail {
            response,
            buffer: Vec::new(),
        })
    }
}

fn api_error(status: u16, body: &str) -> IpfsError {
    let message = serde_json::from_str::<ApiError>(body)
        .map(|err| err.message)
        .unwrap_or_else(|_| body.trim().to_string());

    if message.contains(DIRECTORY_MESSAGE) {
        IpfsError::IsDirectory
    } else {
        IpfsError::Api { status, message }
    }
}

#[async_trait]
impl ObjectSource for IpfsClient {
    async fn cat(&self, hash: &str, length: Option<usize>) -> Result<Vec<u8>, IpfsError> {
        let mut query = vec![("arg", hash.to_string())];
        if let Some(length) = length {
            query.push(("length", length.to_string()));
        }

        let response = self.request(&self.client, "cat", &query).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn ls(&self, hash: &str) -> Result<Vec<Link>, IpfsError> {
        let response = self
            .request(&self.client, "ls", &[("arg", hash.to_string())])
            .await?;
        let listing: LsResponse = serde_json::from_str(&response.text().await?)?;

        Ok(listing
            .objects
            .into_iter()
            .next()
            .map(|object| object.links)
            .unwrap_or_default())
    }
}

/// Newline-delimited JSON event stream
pub struct LogTail {
    response: Response,
    buffer: Vec<u8>,
}

impl LogTail {
    /// Next event, `None` once the daemon closes the stream
    ///
    /// Lines that are not valid events are skipped.
    pub async fn next_event(&mut self) -> Result<Option<LogEvent>, IpfsError> {
        loop {
            while let Some(line) = take_line(&mut self.buffer) {
                match parse_event(&line) {
                    Some(event) => return Ok(Some(event)),
                    None => debug!("Skipped log line of {} bytes", line.len()),
                }
            }

            match self.response.chunk().await? {
                Some(chunk) => self.buffer.extend_from_slice(&chunk),
                None => {
                    let rest = std::mem::take(&mut self.buffer);
                    return Ok(parse_event(&rest));
                }
            }
        }
    }
}

/// Splits the first complete line off the buffer
fn take_line(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let end = buffer.iter().position(|&b| b == b'\n')?;
    let mut line: Vec<u8> = buffer.drain(..=end).collect();
    line.pop();
    Some(line)
}

fn parse_event(line: &[u8]) -> Option<LogEvent> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(line).ok()
}
