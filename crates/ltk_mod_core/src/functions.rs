//! File selection across a mod's option groups.
//!
//! These helpers combine a [`ModDescriptor`] with one collection's
//! [`ModSettings`] and answer which file a mod supplies for a virtual path.
//!
//! # Claims
//!
//! A group *claims* a virtual path when any of its options maps that path,
//! whether or not the option is selected. A claimed path is never served from
//! the mod's unconditional file set: if no selected option supplies a file, the
//! path resolves to [`Redirect::Removed`] for that mod.

use crate::descriptor::ModDescriptor;
use crate::group::SelectionType;
use crate::path::{GamePath, RealPath};
use crate::settings::{ModSettings, NamedModSettings};
use std::collections::{BTreeMap, BTreeSet};

/// What a mod does to one virtual path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Redirect {
    /// Serve this file instead of the original.
    File(RealPath),
    /// Serve nothing: a group claims the path but no selected option fills it.
    Removed,
}

impl Redirect {
    pub fn file(&self) -> Option<&RealPath> {
        match self {
            Redirect::File(file) => Some(file),
            Redirect::Removed => None,
        }
    }
}

/// Resolve `path` for one mod under `settings`.
///
/// Returns `None` when the mod does not touch the path at all. When several
/// selected options supply a file, the first one wins, walking groups by name
/// and options in declaration order.
pub fn resolve_path(
    path: &GamePath,
    settings: &ModSettings,
    descriptor: &ModDescriptor,
) -> Option<Redirect> {
    let mut claimed = false;
    let mut chosen: Option<&RealPath> = None;

    for group in descriptor.groups().filter(|g| g.claims(path)) {
        claimed = true;
        if chosen.is_some() {
            continue;
        }
        chosen = group
            .selected_options(settings.selection(group.name()))
            .into_iter()
            .find_map(|option| option.files.get(path));
    }

    match (claimed, chosen) {
        (_, Some(file)) => Some(Redirect::File(file.clone())),
        (true, None) => Some(Redirect::Removed),
        (false, None) => descriptor
            .default_file(path)
            .map(|file| Redirect::File(file.clone())),
    }
}

/// Every file `path` could ever become in this mod, ignoring selections.
///
/// Used for inventory and diagnostics. Falls back to the mod's own file at
/// `path` when no option maps it.
pub fn all_files_for_path(path: &GamePath, descriptor: &ModDescriptor) -> BTreeSet<RealPath> {
    let mut files: BTreeSet<RealPath> = descriptor
        .groups()
        .flat_map(|g| g.options())
        .filter_map(|option| option.files.get(path).cloned())
        .collect();

    if files.is_empty() {
        files.extend(descriptor.default_file(path).cloned());
    }

    files
}

/// Virtual paths that `file` currently satisfies under `settings`.
///
/// The inverse of [`resolve_path`]: a file used by any option of a group is
/// only served through the selected options of that group, never at its own
/// location.
pub fn files_for_config(
    file: &RealPath,
    settings: &ModSettings,
    descriptor: &ModDescriptor,
) -> BTreeSet<GamePath> {
    let mut claimed = false;
    let mut paths = BTreeSet::new();

    for group in descriptor.groups().filter(|g| !g.options().is_empty()) {
        if !group.claims_file(file) {
            continue;
        }
        claimed = true;
        for option in group.selected_options(settings.selection(group.name())) {
            paths.extend(
                option
                    .files
                    .iter()
                    .filter(|(_, f)| *f == file)
                    .map(|(path, _)| path.clone()),
            );
        }
    }

    if !claimed {
        paths.extend(
            descriptor
                .files()
                .iter()
                .filter(|(_, f)| *f == file)
                .map(|(path, _)| path.clone()),
        );
    }

    paths
}

/// Convert option names into indices and bitmasks.
///
/// Unknown groups and option names are dropped without error. A single
/// selection uses the last listed name, falling back to index 0 when the list
/// is empty or the name is unknown. Groups the mod declares but the named
/// settings omit are filled in with 0.
pub fn convert_named_settings(named: &NamedModSettings, descriptor: &ModDescriptor) -> ModSettings {
    let mut settings = BTreeMap::new();

    for (group_name, option_names) in &named.settings {
        let Some(group) = descriptor.group(group_name) else {
            tracing::debug!(
                "Dropping unknown group '{}' for mod {}",
                group_name,
                descriptor.identity()
            );
            continue;
        };

        let value = match group.selection_type() {
            SelectionType::Single => option_names
                .last()
                .and_then(|name| group.option_index(name))
                .unwrap_or(0) as u32,
            SelectionType::Multi => option_names
                .iter()
                .filter_map(|name| group.option_index(name))
                .fold(0u32, |mask, idx| mask | (1 << idx)),
        };
        settings.insert(group_name.clone(), value);
    }

    let mut result = ModSettings {
        enabled: named.enabled,
        priority: named.priority,
        settings,
    };
    result.fix_groups(descriptor);
    result
}

/// Drop settings of mods that are no longer installed.
///
/// Returns whether any entry was removed.
pub fn cleanup_collection<'a>(
    settings: &mut BTreeMap<String, ModSettings>,
    valid_identities: impl IntoIterator<Item = &'a str>,
) -> bool {
    let valid: BTreeSet<&str> = valid_identities.into_iter().collect();
    let before = settings.len();
    settings.retain(|identity, _| valid.contains(identity.as_str()));
    let removed = before - settings.len();
    if removed > 0 {
        tracing::info!("Removed settings of {} missing mod(s)", removed);
    }
    removed > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ModMeta;
    use crate::group::{GroupOption, OptionGroup};

    /// A mod with a physical file at `tex/c.tex`, a single group `Variant`
    /// (Red maps nothing, Blue remaps `tex/c.tex`) and a multi group `Extras`.
    fn crimson() -> ModDescriptor {
        ModDescriptor::new("crimson", "/mods/crimson", ModMeta::named("Crimson"))
            .with_file("tex/c.tex", "content/tex/c.tex")
            .with_file("tex/plain.tex", "content/tex/plain.tex")
            .with_group(
                OptionGroup::new(
                    "Variant",
                    SelectionType::Single,
                    vec![
                        GroupOption::new("Red"),
                        GroupOption::new("Blue").with_file("tex/c.tex", "options/blue.tex"),
                    ],
                )
                .unwrap(),
            )
            .unwrap()
            .with_group(
                OptionGroup::new(
                    "Extras",
                    SelectionType::Multi,
                    vec![
                        GroupOption::new("Hat").with_file("mdl/hat.mdl", "options/hat.mdl"),
                        GroupOption::new("Scarf")
                            .with_file("mdl/scarf.mdl", "options/scarf.mdl")
                            .with_file("mdl/hat.mdl", "options/scarf_hat.mdl"),
                    ],
                )
                .unwrap(),
            )
            .unwrap()
    }

    fn settings(variant: u32, extras: u32) -> ModSettings {
        ModSettings {
            enabled: true,
            priority: 0,
            settings: BTreeMap::from([
                ("Variant".to_string(), variant),
                ("Extras".to_string(), extras),
            ]),
        }
    }

    #[test]
    fn test_claimed_path_without_selected_alternative_is_removed() {
        let mod_ = crimson();
        let path = GamePath::new("tex/c.tex");

        // Red selected: the group claims the path but supplies nothing
        assert_eq!(
            resolve_path(&path, &settings(0, 0), &mod_),
            Some(Redirect::Removed)
        );
        assert_eq!(
            resolve_path(&path, &settings(1, 0), &mod_),
            Some(Redirect::File(RealPath::from("options/blue.tex")))
        );
    }

    #[test]
    fn test_out_of_range_single_selection_is_no_selection() {
        let mod_ = crimson();
        let path = GamePath::new("tex/c.tex");
        assert_eq!(
            resolve_path(&path, &settings(9, 0), &mod_),
            Some(Redirect::Removed)
        );
    }

    #[test]
    fn test_unclaimed_path_uses_default_file() {
        let mod_ = crimson();
        assert_eq!(
            resolve_path(&GamePath::new("TEX/plain.tex"), &settings(0, 0), &mod_),
            Some(Redirect::File(RealPath::from("content/tex/plain.tex")))
        );
        assert_eq!(
            resolve_path(&GamePath::new("tex/other.tex"), &settings(0, 0), &mod_),
            None
        );
    }

    #[test]
    fn test_multi_selection_first_option_wins() {
        let mod_ = crimson();
        let hat = GamePath::new("mdl/hat.mdl");

        assert_eq!(
            resolve_path(&hat, &settings(0, 0b11), &mod_),
            Some(Redirect::File(RealPath::from("options/hat.mdl")))
        );
        assert_eq!(
            resolve_path(&hat, &settings(0, 0b10), &mod_),
            Some(Redirect::File(RealPath::from("options/scarf_hat.mdl")))
        );
        assert_eq!(
            resolve_path(&hat, &settings(0, 0), &mod_),
            Some(Redirect::Removed)
        );
    }

    #[test]
    fn test_all_files_for_path_ignores_selection() {
        let mod_ = crimson();

        let hat: Vec<String> = all_files_for_path(&GamePath::new("mdl/hat.mdl"), &mod_)
            .iter()
            .map(|f| f.to_string())
            .collect();
        assert_eq!(hat, vec!["options/hat.mdl", "options/scarf_hat.mdl"]);

        let plain = all_files_for_path(&GamePath::new("tex/plain.tex"), &mod_);
        assert_eq!(
            plain.into_iter().collect::<Vec<_>>(),
            vec![RealPath::from("content/tex/plain.tex")]
        );

        assert!(all_files_for_path(&GamePath::new("nope.tex"), &mod_).is_empty());
    }

    #[test]
    fn test_files_for_config() {
        let mod_ = crimson();

        let scarf_hat = RealPath::from("options/scarf_hat.mdl");
        assert!(files_for_config(&scarf_hat, &settings(0, 0b01), &mod_).is_empty());
        assert_eq!(
            files_for_config(&scarf_hat, &settings(0, 0b10), &mod_)
                .into_iter()
                .collect::<Vec<_>>(),
            vec![GamePath::new("mdl/hat.mdl")]
        );

        let plain = RealPath::from("content/tex/plain.tex");
        assert_eq!(
            files_for_config(&plain, &settings(0, 0), &mod_)
                .into_iter()
                .collect::<Vec<_>>(),
            vec![GamePath::new("tex/plain.tex")]
        );
    }

    #[test]
    fn test_convert_named_settings() {
        let mod_ = crimson();
        let named = NamedModSettings {
            enabled: true,
            priority: 4,
            settings: BTreeMap::from([
                ("Variant".to_string(), vec!["Red".to_string(), "Blue".to_string()]),
                (
                    "Extras".to_string(),
                    vec!["Scarf".to_string(), "Cape".to_string()],
                ),
                ("Missing".to_string(), vec!["Anything".to_string()]),
            ]),
        };

        let settings = convert_named_settings(&named, &mod_);
        assert!(settings.enabled);
        assert_eq!(settings.priority, 4);
        assert_eq!(settings.selection("Variant"), 1);
        assert_eq!(settings.selection("Extras"), 0b10);
        assert!(!settings.settings.contains_key("Missing"));
    }

    #[test]
    fn test_convert_named_settings_unmatched_single_is_zero() {
        let mod_ = crimson();
        let named = NamedModSettings {
            settings: BTreeMap::from([
                ("Variant".to_string(), vec!["Green".to_string()]),
                ("Extras".to_string(), vec![]),
            ]),
            ..Default::default()
        };

        let settings = convert_named_settings(&named, &mod_);
        assert_eq!(settings.selection("Variant"), 0);
        assert_eq!(settings.selection("Extras"), 0);
    }

    #[test]
    fn test_cleanup_collection() {
        let mut settings = BTreeMap::from([
            ("a".to_string(), ModSettings::default()),
            ("b".to_string(), ModSettings::default()),
        ]);

        assert!(cleanup_collection(&mut settings, ["a", "c"]));
        assert_eq!(settings.keys().collect::<Vec<_>>(), vec!["a"]);
        assert!(!cleanup_collection(&mut settings, ["a"]));
    }
}
