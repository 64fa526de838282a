//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::fetcher::{FetchError, Fetcher, ProgressCallback};

/// A recorded fetch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    /// Source location requested.
    pub source: String,
    /// Destination path requested.
    pub destination: PathBuf,
    /// Whether the fetch succeeded.
    pub success: bool,
}

/// Failure to simulate for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFetchFailure {
    /// Transport failure.
    Network,
    /// HTTP error status.
    NotFound,
    /// Local write failure.
    Io,
}

impl MockFetchFailure {
    fn to_error(self, source: &str, destination: &Path) -> FetchError {
        match self {
            Self::Network => FetchError::Network(format!("connection reset fetching {}", source)),
            Self::NotFound => FetchError::Http {
                status: 404,
                url: source.to_string(),
            },
            Self::Io => FetchError::io(
                destination,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
            ),
        }
    }
}

/// Mock implementation of the Fetcher trait.
///
/// Provides controllable behavior for testing:
/// - Track fetches for assertions
/// - Simulate per-source failures
/// - Simulate progress callbacks (duplicates included)
/// - Measure how many fetches run at the same time
///
/// Successful fetches write `content` to the destination so later runs see
/// the file.
#[derive(Debug, Clone)]
pub struct MockFetcher {
    /// Recorded fetches.
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
    /// Failures keyed by source.
    failures: Arc<RwLock<HashMap<String, MockFetchFailure>>>,
    /// Progress values passed to the callback, in order.
    progress_steps: Arc<RwLock<Vec<u8>>>,
    /// Simulated transfer duration in milliseconds.
    fetch_duration_ms: Arc<RwLock<u64>>,
    /// Bytes written on success.
    content: Arc<RwLock<Vec<u8>>>,
    /// Fetches currently in flight.
    in_flight: Arc<AtomicUsize>,
    /// Highest number of fetches seen in flight at once.
    max_in_flight: Arc<AtomicUsize>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    /// Create a new mock fetcher.
    pub fn new() -> Self {
        Self {
            fetches: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            progress_steps: Arc::new(RwLock::new(vec![0, 0, 25, 25, 50, 75, 100, 100])),
            fetch_duration_ms: Arc::new(RwLock::new(0)),
            content: Arc::new(RwLock::new(b"MZ mock installer".to_vec())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get all recorded fetches.
    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    /// Get the number of fetches performed.
    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }

    /// Whether `source` was requested.
    pub async fn was_fetched(&self, source: &str) -> bool {
        self.fetches.read().await.iter().any(|f| f.source == source)
    }

    /// Make every fetch of `source` fail.
    pub async fn fail_source(&self, source: &str, failure: MockFetchFailure) {
        self.failures
            .write()
            .await
            .insert(source.to_string(), failure);
    }

    /// Set the progress values reported during a fetch. An empty list
    /// simulates a transfer of unknown size.
    pub async fn set_progress_steps(&self, steps: Vec<u8>) {
        *self.progress_steps.write().await = steps;
    }

    /// Set the simulated transfer duration.
    pub async fn set_fetch_duration(&self, duration: Duration) {
        *self.fetch_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Highest number of concurrent fetches observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn record(&self, source: &str, destination: &Path, success: bool) {
        self.fetches.write().await.push(RecordedFetch {
            source: source.to_string(),
            destination: destination.to_path_buf(),
            success,
        });
    }

    async fn transfer(
        &self,
        source: &str,
        destination: &Path,
        on_progress: &ProgressCallback,
    ) -> Result<u64, FetchError> {
        if source.is_empty() {
            return Err(FetchError::invalid_argument("source location is empty"));
        }

        let steps = self.progress_steps.read().await.clone();
        let duration_ms = *self.fetch_duration_ms.read().await;
        let step_delay = Duration::from_millis(duration_ms / (steps.len() as u64 + 1));

        for step in steps {
            tokio::time::sleep(step_delay).await;
            on_progress(step);
        }
        tokio::time::sleep(step_delay).await;

        let failure = self.failures.read().await.get(source).copied();
        if let Some(failure) = failure {
            return Err(failure.to_error(source, destination));
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchError::io(parent, e))?;
        }
        let content = self.content.read().await.clone();
        tokio::fs::write(destination, &content)
            .await
            .map_err(|e| FetchError::io(destination, e))?;

        Ok(content.len() as u64)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(
        &self,
        source: &str,
        destination: &Path,
        on_progress: ProgressCallback,
    ) -> Result<u64, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = self.transfer(source, destination, &on_progress).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.record(source, destination, result.is_ok()).await;
        result
    }
}
