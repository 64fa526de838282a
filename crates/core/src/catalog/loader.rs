//! Loading the catalog from a JSON document.

use std::path::Path;

use tracing::{info, warn};

use super::types::{Catalog, CatalogError, ProgramEntry};

/// Result of a load that never fails: the catalog plus the error, if any,
/// that forced it to be empty.
#[derive(Debug)]
pub struct CatalogLoad {
    pub catalog: Catalog,
    pub error: Option<CatalogError>,
}

/// Parses a JSON array of program records.
pub fn parse_catalog(json: &str) -> Result<Catalog, CatalogError> {
    let entries: Vec<ProgramEntry> =
        serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
    Ok(Catalog::from_entries(entries))
}

/// Loads the catalog from a JSON file.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::NotFound(path.to_path_buf()));
    }

    let json = std::fs::read_to_string(path)?;
    let catalog = parse_catalog(&json)?;
    info!("Loaded {} programs from {:?}", catalog.len(), path);
    Ok(catalog)
}

/// Loads the catalog, degrading to an empty one on any error.
pub fn load_catalog_or_empty(path: &Path) -> CatalogLoad {
    match load_catalog(path) {
        Ok(catalog) => CatalogLoad {
            catalog,
            error: None,
        },
        Err(e) => {
            warn!("Using empty catalog: {}", e);
            CatalogLoad {
                catalog: Catalog::empty(),
                error: Some(e),
            }
        }
    }
}
