//! Mod descriptors.
//!
//! A [`ModDescriptor`] is the resolver's view of one installed mod: who it is,
//! which files it unconditionally provides and which option groups can remap
//! those paths. Descriptors are built once per discovery and replaced as a
//! whole when the mod is reloaded.

use crate::error::{Error, Result};
use crate::group::{GroupOption, OptionGroup};
use crate::path::{GamePath, RealPath};
use camino::{Utf8Path, Utf8PathBuf};
use ltk_mod_project::ModProject;
use std::collections::{BTreeMap, BTreeSet};

/// Display metadata of a mod.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModMeta {
    pub display_name: String,
    pub version: String,
    pub description: String,
    pub authors: Vec<String>,
    pub website: Option<String>,
    pub tags: Vec<String>,
}

impl ModMeta {
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModDescriptor {
    identity: String,
    base_path: Utf8PathBuf,
    pub meta: ModMeta,
    groups: BTreeMap<String, OptionGroup>,
    /// Files present in the mod, keyed by the virtual path they sit at.
    files: BTreeMap<GamePath, RealPath>,
}

impl ModDescriptor {
    /// Create a descriptor without groups or files.
    ///
    /// `identity` is the stable settings key (the mod's directory name) and
    /// never changes for the lifetime of the descriptor.
    pub fn new(identity: impl Into<String>, base_path: impl Into<Utf8PathBuf>, meta: ModMeta) -> Self {
        Self {
            identity: identity.into(),
            base_path: base_path.into(),
            meta,
            groups: BTreeMap::new(),
            files: BTreeMap::new(),
        }
    }

    /// Build a descriptor from a parsed mod definition and the mod's file inventory.
    pub fn from_project(
        identity: impl Into<String>,
        base_path: impl Into<Utf8PathBuf>,
        project: &ModProject,
        files: impl IntoIterator<Item = (GamePath, RealPath)>,
    ) -> Result<Self> {
        let meta = ModMeta {
            display_name: project.display_name.clone(),
            version: project.version.clone(),
            description: project.description.clone(),
            authors: project.authors.iter().map(|a| a.name().to_string()).collect(),
            website: project.website.clone(),
            tags: project.tags.clone(),
        };
        let mut descriptor = Self::new(identity, base_path, meta);

        for group_def in &project.option_groups {
            if group_def.name.is_empty() || group_def.options.iter().any(|o| o.name.is_empty()) {
                return Err(Error::EmptyName(descriptor.identity.clone()));
            }

            let options = group_def
                .options
                .iter()
                .map(|option_def| GroupOption {
                    name: option_def.name.clone(),
                    description: option_def.description.clone(),
                    files: option_def
                        .files
                        .iter()
                        .map(|(path, file)| (GamePath::new(path), RealPath::from(file.as_str())))
                        .collect(),
                })
                .collect();

            let mut group = OptionGroup::new(group_def.name.clone(), group_def.selection, options)?;
            group.description = group_def.description.clone();
            descriptor.add_group(group)?;
        }

        for (path, file) in files {
            descriptor.add_file(path, file);
        }

        tracing::debug!(
            "Built descriptor id={} groups={} files={}",
            descriptor.identity,
            descriptor.groups.len(),
            descriptor.files.len()
        );

        Ok(descriptor)
    }

    /// Add an option group. Group names are unique within a mod.
    pub fn add_group(&mut self, group: OptionGroup) -> Result<()> {
        if self.groups.contains_key(group.name()) {
            return Err(Error::DuplicateGroup {
                identity: self.identity.clone(),
                group: group.name().to_string(),
            });
        }
        self.groups.insert(group.name().to_string(), group);
        Ok(())
    }

    /// Register a file physically present at `path`.
    pub fn add_file(&mut self, path: impl Into<GamePath>, file: impl Into<RealPath>) {
        self.files.insert(path.into(), file.into());
    }

    pub fn with_group(mut self, group: OptionGroup) -> Result<Self> {
        self.add_group(group)?;
        Ok(self)
    }

    pub fn with_file(mut self, path: impl Into<GamePath>, file: impl Into<RealPath>) -> Self {
        self.add_file(path, file);
        self
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn display_name(&self) -> &str {
        &self.meta.display_name
    }

    pub fn base_path(&self) -> &Utf8Path {
        &self.base_path
    }

    /// Groups ordered by name.
    pub fn groups(&self) -> impl Iterator<Item = &OptionGroup> {
        self.groups.values()
    }

    pub fn group(&self, name: &str) -> Option<&OptionGroup> {
        self.groups.get(name)
    }

    /// The unconditional file for `path`, if the mod ships one there.
    pub fn default_file(&self, path: &GamePath) -> Option<&RealPath> {
        self.files.get(path)
    }

    /// Virtual paths covered by the mod's own file set.
    pub fn default_files(&self) -> impl Iterator<Item = &GamePath> {
        self.files.keys()
    }

    pub fn files(&self) -> &BTreeMap<GamePath, RealPath> {
        &self.files
    }

    /// Every virtual path the mod could ever affect: its own files plus every
    /// path named by any option.
    pub fn candidate_paths(&self) -> BTreeSet<&GamePath> {
        let mut paths: BTreeSet<&GamePath> = self.files.keys().collect();
        for group in self.groups.values() {
            for option in group.options() {
                paths.extend(option.files.keys());
            }
        }
        paths
    }

    /// Resolve a mod-relative file against the mod directory.
    pub fn full_path(&self, file: &RealPath) -> RealPath {
        file.resolve_against(&self.base_path)
    }
}
