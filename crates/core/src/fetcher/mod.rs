//! Fetcher module for streaming installers to disk.
//!
//! This module provides the `Fetcher` trait and an HTTP implementation
//! backed by reqwest. Progress is reported as whole percentages and only
//! when it increases; a transfer whose size is unknown reports nothing.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use quickinstall_core::fetcher::{Fetcher, FetcherConfig, HttpFetcher};
//!
//! let fetcher = HttpFetcher::new(FetcherConfig::default())?;
//! fetcher
//!     .fetch(
//!         "https://example.com/setup.exe",
//!         Path::new("Downloads/setup.exe"),
//!         Arc::new(|p| println!("{}%", p)),
//!     )
//!     .await?;
//! ```

mod config;
mod error;
mod http;
mod traits;

pub use config::FetcherConfig;
pub use error::FetchError;
pub use http::{HttpFetcher, WRITE_BUFFER_SIZE};
pub use traits::{Fetcher, ProgressCallback, ProgressTracker};
