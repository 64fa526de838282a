//! HTTP fetcher implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use super::config::FetcherConfig;
use super::error::FetchError;
use super::traits::{Fetcher, ProgressCallback, ProgressTracker};

/// Size of the write buffer between the network and the file.
pub const WRITE_BUFFER_SIZE: usize = 8192;

/// Fetcher that streams an HTTP(S) response body to disk.
///
/// The body is written to `<destination>.part` and renamed onto the
/// destination only once the transfer is complete, so an interrupted
/// download never looks finished.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a new HTTP fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Creates a fetcher with default configuration.
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(FetcherConfig::default())
    }
}

/// Path of the in-flight file for `destination`.
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn percent_of(received: u64, total: u64) -> u8 {
    (received.saturating_mul(100) / total).min(100) as u8
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(
        &self,
        source: &str,
        destination: &Path,
        on_progress: ProgressCallback,
    ) -> Result<u64, FetchError> {
        if source.trim().is_empty() {
            return Err(FetchError::invalid_argument("source location is empty"));
        }
        if destination.as_os_str().is_empty() {
            return Err(FetchError::invalid_argument("destination path is empty"));
        }

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchError::io(parent, e))?;
        }

        debug!("Fetching {} -> {:?}", source, destination);

        let mut response = self.client.get(source).send().await?.error_for_status()?;
        let total = response.content_length().filter(|&len| len > 0);

        let part = partial_path(destination);
        let file = tokio::fs::File::create(&part)
            .await
            .map_err(|e| FetchError::io(&part, e))?;
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);

        let tracker = ProgressTracker::new();
        let mut received: u64 = 0;

        while let Some(chunk) = response.chunk().await? {
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| FetchError::io(&part, e))?;
            received += chunk.len() as u64;

            if let Some(total) = total {
                let percent = percent_of(received, total);
                if tracker.advance(percent) {
                    on_progress(percent);
                }
            }
        }

        writer.flush().await.map_err(|e| FetchError::io(&part, e))?;
        drop(writer);

        tokio::fs::rename(&part, destination)
            .await
            .map_err(|e| FetchError::io(destination, e))?;

        debug!("Fetched {} bytes into {:?}", received, destination);
        Ok(received)
    }
}
