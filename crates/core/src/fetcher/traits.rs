//! Trait definitions for the fetcher module.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use super::error::FetchError;

/// Callback receiving whole-percent progress (0-100).
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Something that can transfer a remote file to a local path.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Transfers `source` into `destination`, returning the number of bytes
    /// written.
    ///
    /// `on_progress` is only invoked when the total size is known, and only
    /// with values strictly greater than the previous one.
    async fn fetch(
        &self,
        source: &str,
        destination: &Path,
        on_progress: ProgressCallback,
    ) -> Result<u64, FetchError>;
}

/// Monotonic de-duplication of percentage updates.
///
/// Safe to share between threads; `advance` returns true for exactly one
/// caller per new maximum.
#[derive(Debug)]
pub struct ProgressTracker {
    last: AtomicI32,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            last: AtomicI32::new(-1),
        }
    }

    /// Records `percent` and reports whether it is a new maximum.
    pub fn advance(&self, percent: u8) -> bool {
        let value = i32::from(percent);
        self.last.fetch_max(value, Ordering::AcqRel) < value
    }

    /// Last reported value, if any.
    pub fn last(&self) -> Option<u8> {
        u8::try_from(self.last.load(Ordering::Acquire)).ok()
    }
}
