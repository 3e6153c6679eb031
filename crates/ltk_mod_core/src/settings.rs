//! Per-mod, per-collection settings.

use crate::descriptor::ModDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State of one mod inside one collection.
///
/// `settings` stores, per group name, an option index for single-selection
/// groups or a bitmask for multi-selection groups.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Higher priority wins conflicts.
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub settings: BTreeMap<String, u32>,
}

impl ModSettings {
    /// Disabled, priority 0, first option (or no bits) in every group.
    pub fn default_for(descriptor: &ModDescriptor) -> Self {
        Self {
            enabled: false,
            priority: 0,
            settings: descriptor
                .groups()
                .map(|g| (g.name().to_string(), 0))
                .collect(),
        }
    }

    /// Current selection of a group; groups without an entry read as 0.
    pub fn selection(&self, group: &str) -> u32 {
        self.settings.get(group).copied().unwrap_or(0)
    }

    /// Align the group entries with the mod's declared groups.
    ///
    /// Missing groups are added with selection 0 and groups the mod no longer
    /// declares are dropped. Returns whether anything changed.
    pub fn fix_groups(&mut self, descriptor: &ModDescriptor) -> bool {
        let before = self.settings.len();
        self.settings
            .retain(|name, _| descriptor.group(name).is_some());
        let mut changed = self.settings.len() != before;

        for group in descriptor.groups() {
            if !self.settings.contains_key(group.name()) {
                self.settings.insert(group.name().to_string(), 0);
                changed = true;
            }
        }

        changed
    }
}

/// Human-readable settings, selecting options by name.
///
/// Produced by people or by older data; converted with
/// [`convert_named_settings`](crate::convert_named_settings).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedModSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub priority: i32,
    /// Group name -> selected option names.
    #[serde(default)]
    pub settings: BTreeMap<String, Vec<String>>,
}
