use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;
use tracing::info;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("QUICKINSTALL_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from file, falling back to defaults (plus environment
/// overrides) when the file does not exist
pub fn load_config_or_default(path: &Path) -> Result<Config, ConfigError> {
    match load_config(path) {
        Err(ConfigError::FileNotFound(_)) => {
            info!("No configuration file at {:?}, using defaults", path);
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Env::prefixed("QUICKINSTALL_").split("__"))
                .extract()
                .map_err(|e| ConfigError::ParseError(e.to_string()))
        }
        other => other,
    }
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
