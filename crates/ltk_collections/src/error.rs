//! Error types for collection and mod management.
//!
//! All fallible functions in this crate return [`Result<T>`], which uses [`Error`]
//! as the error type. Errors of the lower crates (mod definitions, the core
//! model, the organization tree) and `std::io` / `serde_json` errors convert via
//! `From` impls.
//!
//! Resolution never fails: a path nobody redirects is a normal outcome, not an
//! error.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (scanning mods, reading or writing state).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse or serialize persisted state.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A mod definition file could not be read.
    #[error("Mod project error: {0}")]
    Project(#[from] ltk_mod_project::ProjectError),

    /// A mod definition is structurally invalid (duplicate group, too many options).
    #[error(transparent)]
    Core(#[from] ltk_mod_core::Error),

    /// A tree operation was rejected.
    #[error(transparent)]
    Tree(#[from] ltk_mod_tree::Error),

    /// A collection with this name (or one that maps to the same file) exists.
    #[error("Collection already exists: {0}")]
    CollectionExists(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// The default collection is always present.
    #[error("The default collection cannot be deleted")]
    CannotDeleteDefault,

    /// Collection names must contain at least one letter or digit.
    #[error("Invalid collection name: '{0}'")]
    InvalidCollectionName(String),

    #[error("Mod not found: {0}")]
    ModNotFound(String),

    #[error("Mod already registered: {0}")]
    ModExists(String),

    #[error("Mod {identity} has no option group '{group}'")]
    GroupNotFound { identity: String, group: String },

    /// The mod directory is missing or inaccessible.
    #[error("Invalid mod directory: {0}")]
    InvalidModDir(Utf8PathBuf),

    /// A mod directory has neither `mod.config.json` nor `mod.config.toml`.
    #[error("No mod config found in {0}")]
    MissingModConfig(Utf8PathBuf),
}
