//! Error types for tree operations.
//!
//! Every tree operation validates before it mutates, so an operation that
//! returns an error leaves the tree exactly as it was.

use crate::tree::FolderId;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A folder already holds a child (folder or mod) with this name.
    ///
    /// Mods never merge: two mods in one sort slot is a conflict the caller has
    /// to surface.
    #[error("'{name}' already exists in folder '{folder}'")]
    NameCollision { folder: String, name: String },

    /// A folder or leaf name is empty.
    #[error("Invalid name: '{0}'")]
    InvalidName(String),

    #[error("Mod not found in tree: {0}")]
    ModNotFound(String),

    #[error("Mod already registered in tree: {0}")]
    DuplicateMod(String),

    #[error("Folder not found: {0:?}")]
    FolderNotFound(FolderId),

    #[error("No folder at path: {0}")]
    PathNotFound(String),

    /// A folder would end up inside its own subtree.
    #[error("Cannot move folder '{0}' into itself or one of its descendants")]
    FolderCycle(String),

    /// Reading or writing the sort order file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The sort order file is malformed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
