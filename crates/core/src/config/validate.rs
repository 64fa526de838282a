use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Catalog path and download directory are set
/// - Default architecture is not blank
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.catalog.path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog.path cannot be empty".to_string(),
        ));
    }

    if config.orchestrator.download_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "orchestrator.download_dir cannot be empty".to_string(),
        ));
    }

    if config.selection.architecture.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "selection.architecture cannot be empty".to_string(),
        ));
    }

    Ok(())
}
