//! Types for the program catalog.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Tag label that matches every program regardless of its own tags.
pub const ALL_TAG: &str = "all";

/// Errors raised while building or loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(String),

    #[error("Invalid catalog entry: {0}")]
    InvalidEntry(String),
}

/// One installable program.
///
/// Invariants enforced on construction and deserialisation:
/// - `name` is non-empty
/// - at least one architecture target is present
/// - tags are lower case and unique
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawProgramEntry")]
pub struct ProgramEntry {
    name: String,
    architectures: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arguments: Option<String>,
    tags: BTreeSet<String>,
}

/// Wire form of a catalog record. Accepts the PascalCase keys written by
/// older catalog files as well as snake_case.
#[derive(Debug, Deserialize)]
struct RawProgramEntry {
    #[serde(alias = "Name")]
    name: String,
    #[serde(alias = "Architectures", alias = "architecture_targets", default)]
    architectures: Option<BTreeMap<String, String>>,
    #[serde(alias = "Arguments", alias = "install_arguments", default)]
    arguments: Option<String>,
    #[serde(alias = "Tags", default)]
    tags: Option<Vec<String>>,
}

impl TryFrom<RawProgramEntry> for ProgramEntry {
    type Error = CatalogError;

    fn try_from(raw: RawProgramEntry) -> Result<Self, Self::Error> {
        ProgramEntry::new(
            raw.name,
            raw.architectures.unwrap_or_default(),
            raw.arguments,
            raw.tags.unwrap_or_default(),
        )
    }
}

impl ProgramEntry {
    /// Creates a program entry, validating its invariants.
    pub fn new<I, S>(
        name: impl Into<String>,
        architectures: BTreeMap<String, String>,
        arguments: Option<String>,
        tags: I,
    ) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CatalogError::InvalidEntry(
                "program name cannot be empty".to_string(),
            ));
        }
        if architectures.is_empty() {
            return Err(CatalogError::InvalidEntry(format!(
                "program '{}' has no architecture targets",
                name
            )));
        }

        let tags = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(Self {
            name,
            architectures,
            arguments: arguments.filter(|a| !a.trim().is_empty()),
            tags,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Architecture label to download source mapping.
    pub fn architectures(&self) -> &BTreeMap<String, String> {
        &self.architectures
    }

    /// Download source for the given architecture, if the program ships one.
    pub fn source_for(&self, architecture: &str) -> Option<&str> {
        self.architectures.get(architecture).map(String::as_str)
    }

    /// Installer arguments, passed verbatim to the installer runner.
    pub fn arguments(&self) -> Option<&str> {
        self.arguments.as_deref()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Case-insensitive tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag.to_lowercase())
    }
}

/// Ordered, immutable collection of programs plus the derived tag index.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<ProgramEntry>,
    tags: BTreeSet<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::empty()
    }
}

impl Catalog {
    /// An empty catalog. Its tag index still holds [`ALL_TAG`].
    pub fn empty() -> Self {
        Self::from_entries(Vec::new())
    }

    /// Builds a catalog, keeping the input order.
    ///
    /// Names identify programs for selection, so a later entry that repeats
    /// an earlier name is dropped.
    pub fn from_entries(entries: Vec<ProgramEntry>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(entries.len());

        for entry in entries {
            if !seen.insert(entry.name.clone()) {
                warn!("Dropping duplicate catalog entry '{}'", entry.name);
                continue;
            }
            kept.push(entry);
        }

        let mut tags: BTreeSet<String> = kept.iter().flat_map(|e| e.tags.iter().cloned()).collect();
        tags.insert(ALL_TAG.to_string());

        Self {
            entries: kept,
            tags,
        }
    }

    pub fn entries(&self) -> &[ProgramEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a program by name.
    pub fn get(&self, name: &str) -> Option<&ProgramEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// All lower-cased tags seen across entries, always including [`ALL_TAG`].
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Union of architecture labels exposed by any entry.
    pub fn architectures(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .flat_map(|e| e.architectures.keys().cloned())
            .collect()
    }

    /// Whether `entry` belongs to `tag`. [`ALL_TAG`] matches everything.
    pub fn matches_tag(entry: &ProgramEntry, tag: &str) -> bool {
        tag.eq_ignore_ascii_case(ALL_TAG) || entry.has_tag(tag)
    }

    /// Entries matching both the tag and a case-insensitive name substring.
    pub fn filter<'a>(&'a self, tag: &'a str, query: &str) -> impl Iterator<Item = &'a ProgramEntry> + 'a {
        let query = query.trim().to_lowercase();
        self.entries.iter().filter(move |e| {
            Self::matches_tag(e, tag) && (query.is_empty() || e.name.to_lowercase().contains(&query))
        })
    }
}
