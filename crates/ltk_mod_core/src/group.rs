//! Option groups: a mod's togglable axes of variation.

use crate::error::{Error, Result};
use crate::path::{GamePath, RealPath};
use std::collections::BTreeMap;

pub use ltk_mod_project::GroupSelection as SelectionType;

/// Width of a multi-selection bitmask.
pub const MAX_MULTI_OPTIONS: usize = 32;

/// One option of a group, mapping virtual paths to alternate files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOption {
    pub name: String,
    pub description: Option<String>,
    /// Virtual path -> mod-relative file supplied when the option is selected.
    pub files: BTreeMap<GamePath, RealPath>,
}

impl GroupOption {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            files: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, path: impl Into<GamePath>, file: impl Into<RealPath>) -> Self {
        self.files.insert(path.into(), file.into());
        self
    }
}

/// A named group of options with a selection mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionGroup {
    name: String,
    selection: SelectionType,
    pub description: Option<String>,
    options: Vec<GroupOption>,
}

impl OptionGroup {
    /// Create a group, rejecting multi-selection groups that overflow the bitmask.
    pub fn new(
        name: impl Into<String>,
        selection: SelectionType,
        options: Vec<GroupOption>,
    ) -> Result<Self> {
        let name = name.into();
        if selection == SelectionType::Multi && options.len() > MAX_MULTI_OPTIONS {
            return Err(Error::TooManyOptions {
                group: name,
                count: options.len(),
            });
        }
        Ok(Self {
            name,
            selection,
            description: None,
            options,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selection_type(&self) -> SelectionType {
        self.selection
    }

    pub fn options(&self) -> &[GroupOption] {
        &self.options
    }

    /// Index of the option with exactly this name.
    pub fn option_index(&self, name: &str) -> Option<usize> {
        self.options.iter().position(|o| o.name == name)
    }

    /// Whether any option of the group maps `path`, regardless of selection.
    pub fn claims(&self, path: &GamePath) -> bool {
        self.options.iter().any(|o| o.files.contains_key(path))
    }

    /// Whether any option of the group uses `file` as an alternative.
    pub fn claims_file(&self, file: &RealPath) -> bool {
        self.options
            .iter()
            .any(|o| o.files.values().any(|f| f == file))
    }

    /// Options active under `selection`.
    ///
    /// Single groups treat an out-of-range index as no selection. Multi groups
    /// ignore bits past the last option.
    pub fn selected_options(&self, selection: u32) -> Vec<&GroupOption> {
        match self.selection {
            SelectionType::Single => self
                .options
                .get(selection as usize)
                .into_iter()
                .collect(),
            SelectionType::Multi => self
                .options
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx < MAX_MULTI_OPTIONS && selection & (1u32 << idx) != 0)
                .map(|(_, option)| option)
                .collect(),
        }
    }
}
