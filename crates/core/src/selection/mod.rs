//! Selection state - what the user picked and how to fetch it.
//!
//! Selection is kept apart from the catalog, keyed by program name, so the
//! catalog stays immutable while the presentation layer toggles programs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ProgramEntry, ALL_TAG};

/// Architecture used when nothing else is configured.
pub const DEFAULT_ARCHITECTURE: &str = "64-bit";

/// User selection plus the global filters and toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionState {
    selected: HashSet<String>,
    architecture: String,
    tag: String,
    search_query: String,
    install_after_download: bool,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(DEFAULT_ARCHITECTURE, false)
    }
}

/// Everything a run needs, captured at the moment it is triggered.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Selected programs, in catalog order.
    pub entries: Vec<ProgramEntry>,
    pub architecture: String,
    pub install_after_download: bool,
}

impl SelectionState {
    pub fn new(architecture: impl Into<String>, install_after_download: bool) -> Self {
        Self {
            selected: HashSet::new(),
            architecture: architecture.into(),
            tag: ALL_TAG.to_string(),
            search_query: String::new(),
            install_after_download,
        }
    }

    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    pub fn set_architecture(&mut self, architecture: impl Into<String>) {
        self.architecture = architecture.into();
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Sets the active tag filter. Tags are compared in lower case.
    pub fn set_tag(&mut self, tag: &str) {
        let tag = tag.trim().to_lowercase();
        self.tag = if tag.is_empty() { ALL_TAG.to_string() } else { tag };
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn install_after_download(&self) -> bool {
        self.install_after_download
    }

    pub fn set_install_after_download(&mut self, enabled: bool) {
        self.install_after_download = enabled;
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.contains(name)
    }

    pub fn set_selected(&mut self, name: &str, selected: bool) {
        if selected {
            self.selected.insert(name.to_string());
        } else {
            self.selected.remove(name);
        }
    }

    /// Flips the flag for `name` and returns the new value.
    pub fn toggle(&mut self, name: &str) -> bool {
        let now = !self.is_selected(name);
        self.set_selected(name, now);
        now
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selects or deselects every program in the active tag. The search
    /// query does not narrow this.
    pub fn set_all_in_tag(&mut self, catalog: &Catalog, selected: bool) {
        let names: Vec<String> = catalog
            .entries()
            .iter()
            .filter(|e| Catalog::matches_tag(e, &self.tag))
            .map(|e| e.name().to_string())
            .collect();

        for name in names {
            self.set_selected(&name, selected);
        }
    }

    /// True when the active tag has at least one program and all of them
    /// are selected.
    pub fn all_selected_in_tag(&self, catalog: &Catalog) -> bool {
        let mut in_tag = catalog
            .entries()
            .iter()
            .filter(|e| Catalog::matches_tag(e, &self.tag))
            .peekable();

        in_tag.peek().is_some() && in_tag.all(|e| self.is_selected(e.name()))
    }

    /// Programs passing the tag and search filters.
    pub fn visible_entries<'a>(&'a self, catalog: &'a Catalog) -> Vec<&'a ProgramEntry> {
        catalog.filter(&self.tag, &self.search_query).collect()
    }

    /// Selected programs in catalog order. Filters do not hide selections.
    pub fn selected_entries<'a>(&self, catalog: &'a Catalog) -> Vec<&'a ProgramEntry> {
        catalog
            .entries()
            .iter()
            .filter(|e| self.is_selected(e.name()))
            .collect()
    }

    /// Captures what a run needs from the current state.
    pub fn snapshot(&self, catalog: &Catalog) -> RunRequest {
        RunRequest {
            entries: self.selected_entries(catalog).into_iter().cloned().collect(),
            architecture: self.architecture.clone(),
            install_after_download: self.install_after_download,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn catalog() -> Catalog {
        let mk = |name: &str, tags: &[&str]| {
            let mut targets = BTreeMap::new();
            targets.insert("64-bit".to_string(), format!("http://x/{}", name));
            ProgramEntry::new(name, targets, None, tags.iter().copied()).unwrap()
        };
        Catalog::from_entries(vec![
            mk("Firefox", &["browser"]),
            mk("Chrome", &["browser"]),
            mk("VLC", &["media"]),
        ])
    }

    #[test]
    fn test_defaults() {
        let state = SelectionState::default();
        assert_eq!(state.architecture(), "64-bit");
        assert_eq!(state.tag(), "all");
        assert_eq!(state.search_query(), "");
        assert!(!state.install_after_download());
        assert_eq!(state.selected_count(), 0);
    }

    #[test]
    fn test_toggle_and_set() {
        let mut state = SelectionState::default();
        assert!(state.toggle("VLC"));
        assert!(state.is_selected("VLC"));
        assert!(!state.toggle("VLC"));
        state.set_selected("Chrome", true);
        state.set_selected("Chrome", true);
        assert_eq!(state.selected_count(), 1);
    }

    #[test]
    fn test_set_tag_lowercases_and_defaults() {
        let mut state = SelectionState::default();
        state.set_tag("Browser");
        assert_eq!(state.tag(), "browser");
        state.set_tag("");
        assert_eq!(state.tag(), "all");
    }

    #[test]
    fn test_select_all_in_tag_ignores_search() {
        let catalog = catalog();
        let mut state = SelectionState::default();
        state.set_tag("browser");
        state.set_search_query("fire");
        state.set_all_in_tag(&catalog, true);

        assert!(state.is_selected("Firefox"));
        assert!(state.is_selected("Chrome"));
        assert!(!state.is_selected("VLC"));
        assert!(state.all_selected_in_tag(&catalog));

        state.set_all_in_tag(&catalog, false);
        assert_eq!(state.selected_count(), 0);
    }

    #[test]
    fn test_all_selected_in_empty_tag_is_false() {
        let catalog = catalog();
        let mut state = SelectionState::default();
        state.set_tag("games");
        assert!(!state.all_selected_in_tag(&catalog));
    }

    #[test]
    fn test_visible_entries() {
        let catalog = catalog();
        let mut state = SelectionState::default();
        state.set_search_query("C");
        let names: Vec<&str> = state.visible_entries(&catalog).iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["Chrome", "VLC"]);
    }

    #[test]
    fn test_snapshot_keeps_catalog_order_and_ignores_filters() {
        let catalog = catalog();
        let mut state = SelectionState::new("32-bit", true);
        state.set_selected("VLC", true);
        state.set_selected("Firefox", true);
        state.set_selected("Unknown", true);
        state.set_tag("media");

        let request = state.snapshot(&catalog);
        let names: Vec<&str> = request.entries.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["Firefox", "VLC"]);
        assert_eq!(request.architecture, "32-bit");
        assert!(request.install_after_download);
    }
}
