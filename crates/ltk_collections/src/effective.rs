//! Effective mapping computation.
//!
//! Collapses one collection's enabled mods into a single virtual path ->
//! file table.
//!
//! # Algorithm
//!
//! 1. Take every registered mod whose settings in the collection are enabled.
//!    Mods without settings count as disabled.
//! 2. Order them by descending priority. Equal priorities keep discovery order,
//!    so the result is deterministic.
//! 3. Walk every path each mod could affect and resolve it through the mod's
//!    option groups ([`resolve_path`]). The first mod to produce an answer for
//!    a path owns it; later mods never overwrite.
//! 4. A [`Redirect::Removed`] answer owns the path like any other, hiding it
//!    from every lower-priority mod.
//! 5. Every path answered by more than one mod is recorded as a [`Conflict`].

use indexmap::IndexMap;
use ltk_mod_core::{resolve_path, GamePath, ModDescriptor, ModSettings, Redirect};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Registered mods keyed by identity, in discovery order.
pub type ModRegistry = IndexMap<String, Arc<ModDescriptor>>;

/// The winning answer for one virtual path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    /// Identity of the mod that owns the path.
    pub mod_identity: String,
    /// The file to serve, resolved against the mod directory, or a removal.
    pub redirect: Redirect,
}

/// A virtual path that several enabled mods answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub path: GamePath,
    /// Every contributing mod, winner first.
    pub contributions: Vec<ModContribution>,
    /// Identity of the mod whose answer is used.
    pub winner: String,
}

/// Details about one mod's answer for a conflicting path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModContribution {
    pub mod_identity: String,
    pub mod_name: String,
    pub priority: i32,
    /// Position in the registry (0-based).
    pub discovery_order: usize,
    pub redirect: Redirect,
}

/// A collection's fully resolved mapping.
///
/// Built in one piece and never modified afterwards; a rebuild produces a new
/// cache that replaces the old one.
#[derive(Debug, Default)]
pub struct EffectiveCache {
    version: u64,
    entries: HashMap<GamePath, ResolvedEntry>,
    conflicts: Vec<Conflict>,
}

impl EffectiveCache {
    /// The settings version this cache was computed from.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, path: &GamePath) -> Option<&ResolvedEntry> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GamePath, &ResolvedEntry)> {
        self.entries.iter()
    }

    /// Conflicts found during computation, sorted by path.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }
}

/// Compute the effective mapping of `settings` over `registry`.
pub fn compute_effective(
    settings: &BTreeMap<String, ModSettings>,
    registry: &ModRegistry,
    version: u64,
) -> EffectiveCache {
    let mut enabled: Vec<(usize, &ModDescriptor, &ModSettings)> = registry
        .iter()
        .enumerate()
        .filter_map(|(order, (identity, descriptor))| {
            settings
                .get(identity)
                .filter(|s| s.enabled)
                .map(|s| (order, descriptor.as_ref(), s))
        })
        .collect();
    enabled.sort_by(|a, b| b.2.priority.cmp(&a.2.priority).then(a.0.cmp(&b.0)));

    let mut entries: HashMap<GamePath, ResolvedEntry> = HashMap::new();
    let mut claims: HashMap<GamePath, Vec<ModContribution>> = HashMap::new();

    for &(order, descriptor, mod_settings) in &enabled {
        for path in descriptor.candidate_paths() {
            let Some(redirect) = resolve_path(path, mod_settings, descriptor) else {
                continue;
            };
            let redirect = match redirect {
                Redirect::File(file) => Redirect::File(descriptor.full_path(&file)),
                Redirect::Removed => Redirect::Removed,
            };

            entries
                .entry(path.clone())
                .or_insert_with(|| ResolvedEntry {
                    mod_identity: descriptor.identity().to_string(),
                    redirect: redirect.clone(),
                });
            claims.entry(path.clone()).or_default().push(ModContribution {
                mod_identity: descriptor.identity().to_string(),
                mod_name: descriptor.display_name().to_string(),
                priority: mod_settings.priority,
                discovery_order: order,
                redirect,
            });
        }
    }

    let mut conflicts: Vec<Conflict> = claims
        .into_iter()
        .filter(|(_, contributions)| contributions.len() > 1)
        .map(|(path, contributions)| Conflict {
            winner: contributions[0].mod_identity.clone(),
            path,
            contributions,
        })
        .collect();
    conflicts.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::debug!(
        "Computed effective mapping: {} enabled mod(s), {} path(s), {} conflict(s)",
        enabled.len(),
        entries.len(),
        conflicts.len()
    );

    EffectiveCache {
        version,
        entries,
        conflicts,
    }
}
