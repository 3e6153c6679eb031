//! Collection persistence.
//!
//! Everything lives under one data directory:
//!
//! ```text
//! data/
//!   sort_order.json          # Sparse identity -> tree path overrides
//!   collections.json         # Role bindings
//!   collections/
//!     default.json           # One file per collection, named by slug
//!     ranked.json
//! ```
//!
//! A missing file loads as its default. A corrupt collection file is skipped
//! with a warning so one bad file does not hide the others; corrupt role
//! bindings are an error.

use crate::collection::Collection;
use crate::collection_set::{collection_key, CollectionSet, DEFAULT_COLLECTION};
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use ltk_mod_core::ModSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use walkdir::WalkDir;

const COLLECTION_FILE_VERSION: u32 = 1;

/// On-disk form of one collection.
///
/// ```json
/// {
///   "version": 1,
///   "name": "Ranked",
///   "settings": {
///     "crimson-outfit": { "enabled": true, "priority": 5, "settings": { "Variant": 1 } }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionFile {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub settings: BTreeMap<String, ModSettings>,
}

impl From<&Collection> for CollectionFile {
    fn from(collection: &Collection) -> Self {
        Self {
            version: COLLECTION_FILE_VERSION,
            name: collection.name().to_string(),
            settings: collection.settings().clone(),
        }
    }
}

impl From<CollectionFile> for Collection {
    fn from(file: CollectionFile) -> Self {
        Collection::with_settings(file.name, file.settings)
    }
}

/// Which collection fills each role, persisted as `collections.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleBindings {
    pub current: String,
    pub default: Option<String>,
    pub forced: Option<String>,
    /// Identity -> collection name.
    pub characters: BTreeMap<String, String>,
}

impl Default for RoleBindings {
    fn default() -> Self {
        Self {
            current: DEFAULT_COLLECTION.to_string(),
            default: Some(DEFAULT_COLLECTION.to_string()),
            forced: None,
            characters: BTreeMap::new(),
        }
    }
}

/// Reads and writes the files of a data directory.
#[derive(Debug, Clone)]
pub struct CollectionStore {
    data_dir: Utf8PathBuf,
}

impl CollectionStore {
    pub fn new(data_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }

    pub fn sort_order_path(&self) -> Utf8PathBuf {
        self.data_dir.join("sort_order.json")
    }

    pub fn roles_path(&self) -> Utf8PathBuf {
        self.data_dir.join("collections.json")
    }

    pub fn collections_dir(&self) -> Utf8PathBuf {
        self.data_dir.join("collections")
    }

    pub fn collection_path(&self, name: &str) -> Utf8PathBuf {
        self.collections_dir()
            .join(format!("{}.json", collection_key(name)))
    }

    /// Load every readable collection file, sorted by file name.
    pub fn load_collections(&self) -> Result<Vec<Collection>> {
        let dir = self.collections_dir();
        if !dir.as_std_path().is_dir() {
            return Ok(Vec::new());
        }

        let mut collections = Vec::new();
        for entry in WalkDir::new(dir.as_std_path())
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let parsed = std::fs::read_to_string(path)
                .map_err(Error::from)
                .and_then(|contents| Ok(serde_json::from_str::<CollectionFile>(&contents)?));
            match parsed {
                Ok(file) => collections.push(Collection::from(file)),
                Err(e) => {
                    tracing::warn!("Skipping collection file {}: {}", path.display(), e);
                }
            }
        }

        tracing::debug!("Loaded {} collection file(s) from {}", collections.len(), dir);
        Ok(collections)
    }

    /// Write one collection. Creates parent directories if needed.
    pub fn save_collection(&self, collection: &Collection) -> Result<()> {
        let path = self.collection_path(collection.name());
        write_json(&path, &CollectionFile::from(collection))
    }

    /// Delete a collection's file. A missing file is not an error.
    pub fn delete_collection(&self, name: &str) -> Result<()> {
        let path = self.collection_path(name);
        match std::fs::remove_file(path.as_std_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn load_roles(&self) -> Result<RoleBindings> {
        let path = self.roles_path();
        if !path.as_std_path().exists() {
            return Ok(RoleBindings::default());
        }
        let contents = std::fs::read_to_string(path.as_std_path())?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save_roles(&self, roles: &RoleBindings) -> Result<()> {
        write_json(&self.roles_path(), roles)
    }

    /// Load all collections and their role bindings.
    pub fn load(&self) -> Result<CollectionSet> {
        let collections = self.load_collections()?;
        let roles = self.load_roles()?;
        let set = CollectionSet::from_parts(collections, roles);
        tracing::info!(
            "Loaded {} collection(s), current: {}",
            set.len(),
            set.current_name()
        );
        Ok(set)
    }

    /// Write every collection and the role bindings.
    pub fn save_all(&self, set: &CollectionSet) -> Result<()> {
        for collection in set.iter() {
            self.save_collection(collection)?;
        }
        self.save_roles(&set.roles())
    }
}

fn write_json<T: Serialize>(path: &Utf8Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent.as_std_path())?;
    }

    let contents = serde_json::to_string_pretty(value)?;
    std::fs::write(path.as_std_path(), contents)?;
    Ok(())
}
