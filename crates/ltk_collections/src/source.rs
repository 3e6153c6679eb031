//! Mod source abstraction.
//!
//! The [`ModSource`] trait decouples the manager from any particular storage
//! format. A source answers two questions: which mods exist, and what one mod
//! currently looks like. Change detection and deciding *when* to rescan are
//! left to the caller.
//!
//! The crate ships [`FsModSource`] for reading unpacked mod directories.

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use ltk_mod_core::{GamePath, ModDescriptor, RealPath};
use ltk_mod_project::ModProject;
use walkdir::WalkDir;

/// Provides mod descriptors to the [`ModManager`](crate::ModManager).
///
/// Implementations must be [`Send`] and [`Sync`] so the manager can be shared
/// behind a lock. Methods take `&mut self` to allow stateful readers.
pub trait ModSource: Send + Sync {
    /// Identities of every available mod, in discovery order.
    fn list(&mut self) -> Result<Vec<String>>;

    /// Build the current descriptor of one mod.
    fn load(&mut self, identity: &str) -> Result<ModDescriptor>;
}

/// Filesystem-backed mod source.
///
/// Every sub-directory of the mod directory is one mod, identified by its
/// directory name:
///
/// ```text
/// mods/
///   crimson-outfit/
///     mod.config.json           # Metadata and option groups (or mod.config.toml)
///     content/
///       tex/c.tex               # Served at virtual path `tex/c.tex`
///     options/
///       blue/c.tex              # Referenced by an option's file map
/// ```
///
/// Files under `content/` are the mod's unconditional files; the virtual path
/// is the path relative to `content/`. Real paths are kept relative to the mod
/// directory so option files can live anywhere inside it.
pub struct FsModSource {
    mod_dir: Utf8PathBuf,
}

impl FsModSource {
    pub fn new(mod_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            mod_dir: mod_dir.into(),
        }
    }

    pub fn mod_dir(&self) -> &Utf8Path {
        &self.mod_dir
    }

    fn inventory(&self, mod_path: &Utf8Path) -> Vec<(GamePath, RealPath)> {
        let content_dir = mod_path.join("content");
        if !content_dir.as_std_path().is_dir() {
            return Vec::new();
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(content_dir.as_std_path())
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = match Utf8PathBuf::from_path_buf(entry.into_path()) {
                Ok(p) => p,
                Err(p) => {
                    tracing::warn!("Skipping non-UTF-8 path: {}", p.display());
                    continue;
                }
            };
            let (Ok(virtual_path), Ok(real_path)) =
                (path.strip_prefix(&content_dir), path.strip_prefix(mod_path))
            else {
                continue;
            };
            files.push((
                GamePath::new(virtual_path.as_str()),
                RealPath::from(real_path.as_str().replace('\\', "/").as_str()),
            ));
        }
        files
    }
}

impl ModSource for FsModSource {
    fn list(&mut self) -> Result<Vec<String>> {
        if !self.mod_dir.as_std_path().is_dir() {
            return Err(Error::InvalidModDir(self.mod_dir.clone()));
        }

        let mut identities = Vec::new();
        for entry in std::fs::read_dir(self.mod_dir.as_std_path())? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                tracing::warn!("Skipping non-UTF-8 mod directory: {}", path.display());
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if ModProject::find_in_dir(&path).is_none() {
                tracing::warn!("Skipping {}: no mod config", name);
                continue;
            }
            identities.push(name.to_string());
        }

        identities.sort();
        Ok(identities)
    }

    fn load(&mut self, identity: &str) -> Result<ModDescriptor> {
        let mod_path = self.mod_dir.join(identity);
        if !mod_path.as_std_path().is_dir() {
            return Err(Error::ModNotFound(identity.to_string()));
        }

        let config_path = ModProject::find_in_dir(mod_path.as_std_path())
            .ok_or_else(|| Error::MissingModConfig(mod_path.clone()))?;
        let project = ModProject::load(&config_path)?;
        let files = self.inventory(&mod_path);

        Ok(ModDescriptor::from_project(
            identity, mod_path, &project, files,
        )?)
    }
}
