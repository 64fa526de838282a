//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the `Fetcher` and
//! `InstallerRunner` traits so the orchestrator can be exercised without
//! network access or real installers.
//!
//! # Example
//!
//! ```rust,ignore
//! use quickinstall_core::testing::{MockFetcher, MockInstaller};
//!
//! let fetcher = MockFetcher::new();
//! let installer = MockInstaller::new();
//!
//! // Configure mock behaviour
//! fetcher.fail_source("http://x/broken.exe", MockFetchFailure::Network).await;
//! installer.set_exit_code(1603).await;
//! ```

mod mock_fetcher;
mod mock_installer;

pub use mock_fetcher::{MockFetchFailure, MockFetcher, RecordedFetch};
pub use mock_installer::{MockInstaller, MockRunFailure, RecordedRun};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::collections::BTreeMap;

    use crate::catalog::{Catalog, ProgramEntry};

    /// Create a program available for the given architectures, with
    /// sources of the form `http://x/<name>-<arch>`.
    pub fn program(name: &str, architectures: &[&str], tags: &[&str]) -> ProgramEntry {
        let targets: BTreeMap<String, String> = architectures
            .iter()
            .map(|arch| (arch.to_string(), format!("http://x/{}-{}", name, arch)))
            .collect();

        ProgramEntry::new(name, targets, None, tags.iter().copied())
            .expect("fixture program should be valid")
    }

    /// Create a 64-bit only program.
    pub fn program_64(name: &str) -> ProgramEntry {
        program(name, &["64-bit"], &[])
    }

    /// Create a catalog of 64-bit only programs.
    pub fn catalog_64(names: &[&str]) -> Catalog {
        Catalog::from_entries(names.iter().map(|n| program_64(n)).collect())
    }
}
