//! The application context.
//!
//! A [`ModManager`] owns everything a running mod manager needs: the source
//! mods are read from, the discovery-ordered registry, the organization tree,
//! the collections and, optionally, the store they are persisted to. Every
//! operation that can change what a path resolves to ends by recomputing the
//! dirty caches and publishing a new snapshot to the [`SharedResolver`].

use crate::collection_set::CollectionSet;
use crate::effective::{Conflict, ModRegistry, ResolvedEntry};
use crate::error::{Error, Result};
use crate::snapshot::{ResolveSnapshot, ResolveSource, SharedResolver};
use crate::source::{FsModSource, ModSource};
use crate::state::CollectionStore;
use camino::Utf8PathBuf;
use ltk_mod_core::{convert_named_settings, GamePath, ModDescriptor, ModSettings, NamedModSettings, Redirect};
use ltk_mod_tree::{JsonSortOrderStore, ModFileSystem};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Outcome of a full rescan.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Identities of the registered mods, in discovery order.
    pub loaded: Vec<String>,
    /// Mods whose definition could not be read.
    pub failed: Vec<(String, Error)>,
    /// Mods the organization tree could not place.
    pub rejected: Vec<(String, ltk_mod_tree::Error)>,
}

pub struct ModManager {
    source: Box<dyn ModSource>,
    mods: ModRegistry,
    file_system: ModFileSystem,
    collections: CollectionSet,
    store: Option<CollectionStore>,
    resolver: SharedResolver,
}

impl std::fmt::Debug for ModManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModManager")
            .field("mods", &self.mods.len())
            .field("file_system", &self.file_system)
            .field("collections", &self.collections)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ModManager {
    /// Create a manager that keeps collections in memory only.
    ///
    /// No mods are registered until [`discover_mods`](Self::discover_mods) runs.
    pub fn new(
        source: impl ModSource + 'static,
        file_system: ModFileSystem,
        collections: CollectionSet,
    ) -> Self {
        let resolver = SharedResolver::new(collections.snapshot());
        Self {
            source: Box::new(source),
            mods: ModRegistry::new(),
            file_system,
            collections,
            store: None,
            resolver,
        }
    }

    /// Open a mod directory with state persisted under `data_dir`.
    pub fn open(mod_dir: impl Into<Utf8PathBuf>, data_dir: impl Into<Utf8PathBuf>) -> Result<Self> {
        let store = CollectionStore::new(data_dir);
        let sort_orders = JsonSortOrderStore::new(store.sort_order_path());
        let overrides = sort_orders.load()?;
        let collections = store.load()?;

        let mut manager = Self::new(
            FsModSource::new(mod_dir),
            ModFileSystem::new(overrides, sort_orders),
            collections,
        );
        manager.store = Some(store);
        Ok(manager)
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn mods(&self) -> &ModRegistry {
        &self.mods
    }

    pub fn descriptor(&self, identity: &str) -> Option<&ModDescriptor> {
        self.mods.get(identity).map(Arc::as_ref)
    }

    pub fn file_system(&self) -> &ModFileSystem {
        &self.file_system
    }

    /// Tree operations persist their own sort-order changes.
    pub fn file_system_mut(&mut self) -> &mut ModFileSystem {
        &mut self.file_system
    }

    pub fn collections(&self) -> &CollectionSet {
        &self.collections
    }

    pub fn store(&self) -> Option<&CollectionStore> {
        self.store.as_ref()
    }

    /// A handle other threads can resolve through.
    pub fn resolver(&self) -> SharedResolver {
        self.resolver.clone()
    }

    pub fn snapshot(&self) -> Arc<ResolveSnapshot> {
        self.resolver.load()
    }

    // ---------------------------------------------------------------------
    // Mods
    // ---------------------------------------------------------------------

    /// Rescan the source and rebuild the registry, the tree and every cache.
    ///
    /// A mod that fails to load or cannot be placed in the tree is left out
    /// and reported; it does not abort the scan.
    pub fn discover_mods(&mut self) -> Result<DiscoveryReport> {
        let identities = self.source.list()?;

        let mut registry = ModRegistry::new();
        let mut failed = Vec::new();
        for identity in identities {
            match self.source.load(&identity) {
                Ok(descriptor) => {
                    tracing::debug!(
                        "Loaded mod {} ({} group(s), {} file(s))",
                        identity,
                        descriptor.groups().count(),
                        descriptor.files().len()
                    );
                    registry.insert(identity, Arc::new(descriptor));
                }
                Err(e) => {
                    tracing::warn!("Failed to load mod {}: {}", identity, e);
                    failed.push((identity, e));
                }
            }
        }

        // The tree is rebuilt even when saving its sort order fails; the
        // registry follows the tree before any error is returned.
        let loaded = self.file_system.load(
            registry
                .iter()
                .map(|(identity, d)| (identity.clone(), d.display_name().to_string())),
        );
        let tree = self.file_system.tree();
        registry.retain(|identity, _| tree.contains_mod(identity));
        self.mods = registry;

        let mut repaired = BTreeSet::new();
        for descriptor in self.mods.values() {
            repaired.extend(self.collections.fix_groups(descriptor));
        }
        self.collections.invalidate_all();
        self.refresh();

        let persisted = self.persist_collections(repaired);
        let rejected = loaded?;
        persisted?;

        tracing::info!(
            "Discovered {} mod(s), {} failed, {} rejected",
            self.mods.len(),
            failed.len(),
            rejected.len()
        );
        Ok(DiscoveryReport {
            loaded: self.mods.keys().cloned().collect(),
            failed,
            rejected,
        })
    }

    /// Register one new mod from the source.
    pub fn add_mod(&mut self, identity: &str) -> Result<()> {
        if self.mods.contains_key(identity) {
            return Err(Error::ModExists(identity.to_string()));
        }

        let descriptor = self.source.load(identity)?;
        let placed = self.file_system.add_mod(identity, descriptor.display_name());
        if !self.file_system.tree().contains_mod(identity) {
            return placed.map_err(Error::from);
        }

        let repaired = self.collections.fix_groups(&descriptor);
        self.mods
            .insert(identity.to_string(), Arc::new(descriptor));

        tracing::info!("Added mod {}", identity);
        self.collections.invalidate_all();
        self.refresh();

        let persisted = self.persist_collections(repaired);
        placed?;
        persisted
    }

    /// Unregister a mod. Its settings stay in every collection so a later
    /// re-add restores them; removing its files is the caller's job.
    pub fn delete_mod(&mut self, identity: &str) -> Result<()> {
        if self.mods.shift_remove(identity).is_none() {
            return Err(Error::ModNotFound(identity.to_string()));
        }
        self.file_system.remove_mod(identity);

        tracing::info!("Deleted mod {}", identity);
        self.collections.invalidate_all();
        self.refresh();
        Ok(())
    }

    /// Re-read one mod from the source. Returns whether it changed.
    ///
    /// A mod that no longer loads is unregistered and the error returned.
    pub fn reload_mod(&mut self, identity: &str) -> Result<bool> {
        let Some(previous) = self.mods.get(identity).cloned() else {
            return Err(Error::ModNotFound(identity.to_string()));
        };

        let descriptor = match self.source.load(identity) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                tracing::warn!("Reloading mod {} failed, unregistering it: {}", identity, e);
                self.mods.shift_remove(identity);
                self.file_system.remove_mod(identity);
                self.collections.invalidate_all();
                self.refresh();
                return Err(e);
            }
        };

        if *previous == descriptor {
            tracing::debug!("Mod {} is unchanged", identity);
            return Ok(false);
        }

        let renamed = if previous.display_name() != descriptor.display_name() {
            self.file_system
                .set_display_name(identity, descriptor.display_name())
                .map(|_| ())
        } else {
            Ok(())
        };
        let repaired = self.collections.fix_groups(&descriptor);
        self.mods
            .insert(identity.to_string(), Arc::new(descriptor));

        tracing::info!("Reloaded mod {}", identity);
        self.collections.invalidate_all();
        self.refresh();

        let persisted = self.persist_collections(repaired);
        renamed?;
        persisted?;
        Ok(true)
    }

    // ---------------------------------------------------------------------
    // Settings
    //
    // `collection: None` edits the current collection.
    // ---------------------------------------------------------------------

    pub fn set_enabled(&mut self, collection: Option<&str>, identity: &str, enabled: bool) -> Result<bool> {
        self.edit_settings(collection, identity, |s| s.enabled = enabled)
    }

    pub fn set_priority(&mut self, collection: Option<&str>, identity: &str, priority: i32) -> Result<bool> {
        self.edit_settings(collection, identity, |s| s.priority = priority)
    }

    /// Set a group's option index (single) or bitmask (multi).
    pub fn set_selection(
        &mut self,
        collection: Option<&str>,
        identity: &str,
        group: &str,
        selection: u32,
    ) -> Result<bool> {
        let descriptor = self.require_mod(identity)?;
        if descriptor.group(group).is_none() {
            return Err(Error::GroupNotFound {
                identity: identity.to_string(),
                group: group.to_string(),
            });
        }
        self.edit_settings(collection, identity, |s| {
            s.settings.insert(group.to_string(), selection);
        })
    }

    /// Replace a mod's settings with ones selecting options by name.
    pub fn set_named_settings(
        &mut self,
        collection: Option<&str>,
        identity: &str,
        named: &NamedModSettings,
    ) -> Result<bool> {
        let descriptor = self.require_mod(identity)?;
        let settings = convert_named_settings(named, &descriptor);
        let target = self.collections.target_mut(collection)?;
        let changed = target.set_mod_settings(identity, settings);
        let name = target.name().to_string();
        self.settings_changed(&name, changed)
    }

    fn edit_settings<F>(&mut self, collection: Option<&str>, identity: &str, edit: F) -> Result<bool>
    where
        F: FnOnce(&mut ModSettings),
    {
        let descriptor = self.require_mod(identity)?;
        let target = self.collections.target_mut(collection)?;
        let changed = target.update(&descriptor, edit);
        let name = target.name().to_string();
        self.settings_changed(&name, changed)
    }

    fn settings_changed(&mut self, name: &str, changed: bool) -> Result<bool> {
        if changed {
            self.persist_collection(name)?;
            self.refresh();
        }
        Ok(changed)
    }

    fn require_mod(&self, identity: &str) -> Result<Arc<ModDescriptor>> {
        self.mods
            .get(identity)
            .cloned()
            .ok_or_else(|| Error::ModNotFound(identity.to_string()))
    }

    // ---------------------------------------------------------------------
    // Collections
    // ---------------------------------------------------------------------

    pub fn add_collection(&mut self, name: &str, duplicate_from: Option<&str>) -> Result<()> {
        let name = self
            .collections
            .add_collection(name, duplicate_from)?
            .name()
            .to_string();
        self.persist_collection(&name)?;
        self.refresh();
        Ok(())
    }

    pub fn remove_collection(&mut self, name: &str) -> Result<()> {
        self.collections.remove_collection(name)?;
        if let Some(store) = &self.store {
            store.delete_collection(name)?;
        }
        self.roles_changed(true)
    }

    pub fn set_current(&mut self, name: &str) -> Result<bool> {
        let changed = self.collections.set_current(name)?;
        self.roles_changed(changed)?;
        Ok(changed)
    }

    pub fn set_default(&mut self, name: Option<&str>) -> Result<bool> {
        let changed = self.collections.set_default(name)?;
        self.roles_changed(changed)?;
        Ok(changed)
    }

    pub fn set_forced(&mut self, name: Option<&str>) -> Result<bool> {
        let changed = self.collections.set_forced(name)?;
        self.roles_changed(changed)?;
        Ok(changed)
    }

    pub fn set_character_collection(&mut self, identity: &str, name: Option<&str>) -> Result<bool> {
        let changed = self.collections.set_character_collection(identity, name)?;
        self.roles_changed(changed)?;
        Ok(changed)
    }

    pub fn remove_character_collection(&mut self, identity: &str) -> Result<bool> {
        let changed = self.collections.remove_character_collection(identity);
        self.roles_changed(changed)?;
        Ok(changed)
    }

    /// Drop settings of mods that are not registered from one collection.
    pub fn cleanup_collection(&mut self, name: &str) -> Result<bool> {
        let changed = self
            .collections
            .cleanup(name, self.mods.keys().map(String::as_str))?;
        self.settings_changed(name, changed)
    }

    fn roles_changed(&mut self, changed: bool) -> Result<()> {
        if !changed {
            return Ok(());
        }
        if let Some(store) = &self.store {
            store.save_roles(&self.collections.roles())?;
        }
        self.refresh();
        Ok(())
    }

    fn persist_collection(&self, name: &str) -> Result<()> {
        match (&self.store, self.collections.collection(name)) {
            (Some(store), Some(collection)) => store.save_collection(collection),
            _ => Ok(()),
        }
    }

    /// Save each named collection, returning the first failure after trying
    /// them all.
    fn persist_collections<I>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        let mut result = Ok(());
        for name in names {
            if let Err(e) = self.persist_collection(&name) {
                tracing::warn!("Failed to save collection {}: {}", name, e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    // ---------------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------------

    pub fn resolve(&self, path: &GamePath, identity: Option<&str>) -> Option<Redirect> {
        self.collections.resolve(path, identity)
    }

    pub fn resolve_entry(
        &self,
        path: &GamePath,
        identity: Option<&str>,
    ) -> Option<(ResolveSource, &ResolvedEntry)> {
        self.collections.resolve_entry(path, identity)
    }

    pub fn conflicts(&self, collection: Option<&str>) -> Result<&[Conflict]> {
        self.collections.conflicts(collection)
    }

    /// Recompute dirty caches and publish the resulting chain.
    fn refresh(&mut self) {
        self.collections.refresh(&self.mods);
        self.resolver.publish(self.collections.snapshot());
    }
}
