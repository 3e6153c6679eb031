//! Path keys.
//!
//! Two kinds of paths flow through the resolver and they are never compared
//! with each other:
//!
//! - [`GamePath`]: a location inside the base asset archive. Separators are
//!   normalized to `/` and comparison is case-insensitive, while the original
//!   spelling is kept for display.
//! - [`RealPath`]: a file on disk, either relative to a mod directory or
//!   absolute once resolved against it.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A virtual asset path, compared case-insensitively.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct GamePath {
    raw: String,
    key: String,
}

impl GamePath {
    /// Normalize `path` into a game path.
    ///
    /// Backslashes become `/`, and empty segments (leading, trailing or doubled
    /// separators) are dropped.
    pub fn new(path: impl AsRef<str>) -> Self {
        let raw = path
            .as_ref()
            .split(['/', '\\'])
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        let key = raw.to_lowercase();
        Self { raw, key }
    }

    /// The path as it was written, after separator normalization.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The lowercase comparison key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl PartialEq for GamePath {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for GamePath {}

impl Hash for GamePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for GamePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GamePath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Debug for GamePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GamePath({:?})", self.raw)
    }
}

impl fmt::Display for GamePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for GamePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for GamePath {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<GamePath> for String {
    fn from(value: GamePath) -> Self {
        value.raw
    }
}

/// A file on disk supplied by a mod.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RealPath(Utf8PathBuf);

impl RealPath {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Utf8Path {
        &self.0
    }

    pub fn is_absolute(&self) -> bool {
        self.0.is_absolute()
    }

    /// Resolve a mod-relative path against the mod directory.
    ///
    /// Absolute paths are returned unchanged.
    pub fn resolve_against(&self, base: &Utf8Path) -> RealPath {
        if self.0.is_absolute() {
            self.clone()
        } else {
            RealPath(base.join(&self.0))
        }
    }
}

impl fmt::Display for RealPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for RealPath {
    fn from(value: &str) -> Self {
        Self(Utf8PathBuf::from(value))
    }
}

impl From<Utf8PathBuf> for RealPath {
    fn from(value: Utf8PathBuf) -> Self {
        Self(value)
    }
}
