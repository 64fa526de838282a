//! Configuration for the fetcher module.

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Overall timeout for a single transfer in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> u64 {
    3600 // 1 hour
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("quickinstall/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetcherConfig {
    /// Sets the transfer timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::default();
        assert_eq!(config.timeout_secs, 3600);
        assert_eq!(config.connect_timeout_secs, 30);
        assert!(config.user_agent.starts_with("quickinstall/"));
    }

    #[test]
    fn test_partial_deserialize() {
        let config: FetcherConfig = toml::from_str("timeout_secs = 10").unwrap();
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.connect_timeout_secs, 30);
    }
}
