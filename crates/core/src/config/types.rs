use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::fetcher::FetcherConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::selection::DEFAULT_ARCHITECTURE;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub selection: SelectionDefaults,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    8080
}

/// Catalog source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// JSON file listing the installable programs
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("programs.json")
}

/// Initial values for the selection state
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectionDefaults {
    #[serde(default = "default_architecture")]
    pub architecture: String,
    #[serde(default)]
    pub install_after_download: bool,
}

impl Default for SelectionDefaults {
    fn default() -> Self {
        Self {
            architecture: default_architecture(),
            install_after_download: false,
        }
    }
}

fn default_architecture() -> String {
    DEFAULT_ARCHITECTURE.to_string()
}
