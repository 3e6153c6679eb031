//! Error types for building mod descriptors.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Two option groups of one mod share a name.
    #[error("Mod '{identity}' declares group '{group}' more than once")]
    DuplicateGroup { identity: String, group: String },

    /// A multi-selection group has more options than fit in its bitmask.
    #[error("Group '{group}' has {count} options, multi-selection groups allow at most 32")]
    TooManyOptions { group: String, count: usize },

    /// An option group or option has an empty name.
    #[error("Empty name in group definition of mod '{0}'")]
    EmptyName(String),
}
