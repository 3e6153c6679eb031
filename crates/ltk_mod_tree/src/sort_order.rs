//! Persisted placement overrides.
//!
//! A mod without an override sits at the root under its display name. Once
//! the user moves or renames it, its full virtual path is recorded here and
//! re-applied whenever the tree is rebuilt.
//!
//! # JSON format
//!
//! ```json
//! {
//!   "crimson-outfit": "Outfits/Red/Crimson",
//!   "clean-ui": "Interface/Clean UI"
//! }
//! ```

use crate::error::Result;
use crate::tree::sanitize_name;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mod identity -> full virtual path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortOrderTable {
    entries: BTreeMap<String, String>,
}

impl SortOrderTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &str) -> Option<&str> {
        self.entries.get(identity).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn remove(&mut self, identity: &str) -> bool {
        self.entries.remove(identity).is_some()
    }

    /// Record where a mod now sits.
    ///
    /// A mod whose full path equals its display name is in its default slot and
    /// gets no entry. Returns whether the table changed.
    pub fn update(&mut self, identity: &str, full_path: &str, display_name: &str) -> bool {
        if is_default_placement(full_path, display_name) {
            return self.remove(identity);
        }
        match self.entries.get(identity) {
            Some(existing) if existing == full_path => false,
            _ => {
                self.entries
                    .insert(identity.to_string(), full_path.to_string());
                true
            }
        }
    }

    /// Load the table, treating a missing file as empty.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        if !path.as_std_path().exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path.as_std_path())?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save the table, creating parent directories if needed.
    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent.as_std_path())?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_std_path(), contents)?;
        Ok(())
    }
}

fn is_default_placement(full_path: &str, display_name: &str) -> bool {
    full_path.to_lowercase() == sanitize_name(display_name).to_lowercase()
}

/// Where a [`ModFileSystem`](crate::ModFileSystem) writes its overrides.
pub trait SortOrderStore: Send + Sync {
    fn save(&mut self, table: &SortOrderTable) -> Result<()>;
}

/// Stores the table as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonSortOrderStore {
    path: Utf8PathBuf,
}

impl JsonSortOrderStore {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn load(&self) -> Result<SortOrderTable> {
        SortOrderTable::load(&self.path)
    }
}

impl SortOrderStore for JsonSortOrderStore {
    fn save(&mut self, table: &SortOrderTable) -> Result<()> {
        tracing::debug!("Saving {} sort order override(s) to {}", table.len(), self.path);
        table.save(&self.path)
    }
}

/// Discards every save. Useful when the tree is only displayed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSortOrderStore;

impl SortOrderStore for NullSortOrderStore {
    fn save(&mut self, _table: &SortOrderTable) -> Result<()> {
        Ok(())
    }
}
