//! A named set of mod settings and its cached effective mapping.

use crate::effective::{compute_effective, Conflict, EffectiveCache, ModRegistry, ResolvedEntry};
use ltk_mod_core::{cleanup_collection, GamePath, ModDescriptor, ModSettings};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One complete assignment of enabled/priority/selection state.
///
/// Every change to the settings bumps the collection's version. The cache
/// remembers the version it was computed from, so a collection is dirty
/// exactly when the two differ. Membership and file inventory changes outside
/// the collection are signalled with [`invalidate`](Self::invalidate).
#[derive(Debug, Clone)]
pub struct Collection {
    name: String,
    settings: BTreeMap<String, ModSettings>,
    version: u64,
    cache: Arc<EffectiveCache>,
}

impl Collection {
    /// Create an empty collection. Its cache starts out dirty.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_settings(name, BTreeMap::new())
    }

    pub fn with_settings(name: impl Into<String>, settings: BTreeMap<String, ModSettings>) -> Self {
        Self {
            name: name.into(),
            settings,
            version: 1,
            cache: Arc::new(EffectiveCache::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &BTreeMap<String, ModSettings> {
        &self.settings
    }

    pub fn mod_settings(&self, identity: &str) -> Option<&ModSettings> {
        self.settings.get(identity)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_dirty(&self) -> bool {
        self.cache.version() != self.version
    }

    /// Mark the cache stale without touching the settings.
    pub fn invalidate(&mut self) {
        self.version += 1;
    }

    /// Edit one mod's settings, creating defaults for the mod first if needed.
    ///
    /// Returns whether the settings changed.
    pub fn update<F>(&mut self, descriptor: &ModDescriptor, edit: F) -> bool
    where
        F: FnOnce(&mut ModSettings),
    {
        let entry = self
            .settings
            .entry(descriptor.identity().to_string())
            .or_insert_with(|| ModSettings::default_for(descriptor));
        let before = entry.clone();
        edit(entry);
        let changed = *entry != before;
        if changed {
            self.version += 1;
        }
        changed
    }

    /// Replace one mod's settings wholesale.
    pub fn set_mod_settings(&mut self, identity: &str, settings: ModSettings) -> bool {
        if self.settings.get(identity) == Some(&settings) {
            return false;
        }
        self.settings.insert(identity.to_string(), settings);
        self.version += 1;
        true
    }

    /// Drop settings of mods not in `valid_identities`.
    pub fn cleanup<'a>(&mut self, valid_identities: impl IntoIterator<Item = &'a str>) -> bool {
        let changed = cleanup_collection(&mut self.settings, valid_identities);
        if changed {
            self.version += 1;
        }
        changed
    }

    /// Align a mod's group selections with its current groups.
    pub fn fix_groups(&mut self, descriptor: &ModDescriptor) -> bool {
        let changed = self
            .settings
            .get_mut(descriptor.identity())
            .is_some_and(|settings| settings.fix_groups(descriptor));
        if changed {
            self.version += 1;
        }
        changed
    }

    /// Rebuild the cache if it is dirty. Returns whether it was rebuilt.
    ///
    /// The new cache replaces the old one; holders of the previous
    /// [`cache`](Self::cache) keep a consistent view.
    pub fn recompute(&mut self, registry: &ModRegistry) -> bool {
        if !self.is_dirty() {
            return false;
        }
        self.cache = Arc::new(compute_effective(&self.settings, registry, self.version));
        true
    }

    pub fn cache(&self) -> Arc<EffectiveCache> {
        Arc::clone(&self.cache)
    }

    /// Look up `path` in the current cache.
    pub fn resolve(&self, path: &GamePath) -> Option<&ResolvedEntry> {
        self.cache.get(path)
    }

    pub fn conflicts(&self) -> &[Conflict] {
        self.cache.conflicts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effective::tests::{enabled, simple_mod};
    use ltk_mod_core::Redirect;

    fn registry() -> ModRegistry {
        [simple_mod("A", "a.tex", "a.tex"), simple_mod("B", "a.tex", "b.tex")]
            .into_iter()
            .map(|m| (m.identity().to_string(), m))
            .collect()
    }

    #[test]
    fn test_new_collection_is_dirty() {
        let mut collection = Collection::new("Test");
        assert!(collection.is_dirty());
        assert!(collection.recompute(&registry()));
        assert!(!collection.is_dirty());
        assert!(!collection.recompute(&registry()));
    }

    #[test]
    fn test_update_tracks_changes() {
        let registry = registry();
        let mut collection = Collection::new("Test");
        collection.recompute(&registry);

        assert!(collection.update(&registry["A"], |s| s.enabled = true));
        assert!(collection.is_dirty());
        collection.recompute(&registry);

        // Same value again: nothing changes
        assert!(!collection.update(&registry["A"], |s| s.enabled = true));
        assert!(!collection.is_dirty());
    }

    #[test]
    fn test_disabling_removes_entries() {
        let registry = registry();
        let mut collection = Collection::with_settings(
            "Test",
            BTreeMap::from([("A".to_string(), enabled(0))]),
        );
        collection.recompute(&registry);
        assert!(collection.resolve(&GamePath::new("a.tex")).is_some());

        collection.update(&registry["A"], |s| s.enabled = false);
        collection.recompute(&registry);
        assert!(collection.resolve(&GamePath::new("a.tex")).is_none());
    }

    #[test]
    fn test_old_cache_survives_recompute() {
        let registry = registry();
        let mut collection = Collection::with_settings(
            "Test",
            BTreeMap::from([("A".to_string(), enabled(0)), ("B".to_string(), enabled(1))]),
        );
        collection.recompute(&registry);
        let held = collection.cache();

        collection.update(&registry["A"], |s| s.priority = 5);
        collection.recompute(&registry);

        let path = GamePath::new("a.tex");
        assert_eq!(held.get(&path).unwrap().mod_identity, "B");
        assert_eq!(collection.resolve(&path).unwrap().mod_identity, "A");
        assert_eq!(
            collection.resolve(&path).unwrap().redirect,
            Redirect::File("/mods/A/a.tex".into())
        );
    }

    #[test]
    fn test_invalidate_marks_dirty() {
        let mut collection = Collection::new("Test");
        collection.recompute(&registry());
        collection.invalidate();
        assert!(collection.is_dirty());
    }

    #[test]
    fn test_cleanup() {
        let mut collection = Collection::with_settings(
            "Test",
            BTreeMap::from([("A".to_string(), enabled(0)), ("gone".to_string(), enabled(0))]),
        );
        let version = collection.version();
        assert!(collection.cleanup(["A", "B"]));
        assert_eq!(collection.settings().len(), 1);
        assert!(collection.version() > version);
    }
}
