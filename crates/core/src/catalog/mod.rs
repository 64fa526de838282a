//! Program catalog - the immutable list of installable programs.
//!
//! The catalog is loaded once at startup from a JSON document and never
//! mutated afterwards. Selection lives in [`crate::selection`], keyed by
//! program name.

mod loader;
mod types;

pub use loader::{load_catalog, load_catalog_or_empty, parse_catalog, CatalogLoad};
pub use types::*;
