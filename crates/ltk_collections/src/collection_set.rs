//! All collections plus the role bindings that pick which ones resolve.
//!
//! Roles:
//!
//! - **current**: the collection the user edits. Never consulted by
//!   [`resolve`](CollectionSet::resolve).
//! - **default**: answers for every requester without a character binding,
//!   and for paths a character collection leaves open. May be unbound.
//! - **forced**: consulted beneath default. May be unbound.
//! - **characters**: per-identity overrides consulted first.
//!
//! Resolution is a strict fallback chain: the first collection whose cache has
//! an entry for the path answers, even when that entry removes the asset.

use crate::collection::Collection;
use crate::effective::{Conflict, ModRegistry, ResolvedEntry};
use crate::error::{Error, Result};
use crate::snapshot::{ResolveSnapshot, ResolveSource};
use crate::state::RoleBindings;
use indexmap::IndexMap;
use ltk_mod_core::{GamePath, ModDescriptor, Redirect};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Name of the collection that always exists.
pub const DEFAULT_COLLECTION: &str = "Default";

#[derive(Debug, Clone)]
pub struct CollectionSet {
    collections: IndexMap<String, Collection>,
    current: String,
    default_: Option<String>,
    forced: Option<String>,
    characters: BTreeMap<String, String>,
}

impl Default for CollectionSet {
    fn default() -> Self {
        Self::new()
    }
}

/// File-name key of a collection name. Names that share a key collide.
pub(crate) fn collection_key(name: &str) -> String {
    slug::slugify(name)
}

impl CollectionSet {
    /// A set holding only the default collection, bound as current and default.
    pub fn new() -> Self {
        let mut collections = IndexMap::new();
        collections.insert(
            DEFAULT_COLLECTION.to_string(),
            Collection::new(DEFAULT_COLLECTION),
        );
        Self {
            collections,
            current: DEFAULT_COLLECTION.to_string(),
            default_: Some(DEFAULT_COLLECTION.to_string()),
            forced: None,
            characters: BTreeMap::new(),
        }
    }

    /// Rebuild a set from persisted collections and role bindings.
    ///
    /// The default collection is created if missing. Bindings that name a
    /// missing collection are dropped with a warning.
    pub fn from_parts(collections: Vec<Collection>, roles: RoleBindings) -> Self {
        let mut set = Self::new();
        for collection in collections {
            let key = collection_key(collection.name());
            if collection.name() != DEFAULT_COLLECTION
                && set.collections.keys().any(|name| collection_key(name) == key)
            {
                tracing::warn!("Skipping duplicate collection '{}'", collection.name());
                continue;
            }
            set.collections
                .insert(collection.name().to_string(), collection);
        }

        let known = |name: &String, role: &str| {
            let exists = set.collections.contains_key(name);
            if !exists {
                tracing::warn!("Dropping {} binding to missing collection '{}'", role, name);
            }
            exists
        };

        let current = Some(roles.current)
            .filter(|name| known(name, "current"))
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
        let default_ = roles.default.filter(|name| known(name, "default"));
        let forced = roles.forced.filter(|name| known(name, "forced"));
        let characters = roles
            .characters
            .into_iter()
            .filter(|(_, name)| known(name, "character"))
            .collect();

        set.current = current;
        set.default_ = default_;
        set.forced = forced;
        set.characters = characters;
        set
    }

    /// Role bindings in their persisted form.
    pub fn roles(&self) -> RoleBindings {
        RoleBindings {
            current: self.current.clone(),
            default: self.default_.clone(),
            forced: self.forced.clone(),
            characters: self.characters.clone(),
        }
    }

    // ---------------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------------

    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    pub fn collection_mut(&mut self, name: &str) -> Option<&mut Collection> {
        self.collections.get_mut(name)
    }

    /// Collections in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub fn current_name(&self) -> &str {
        &self.current
    }

    pub fn current(&self) -> Option<&Collection> {
        self.collections.get(&self.current)
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_.as_deref()
    }

    pub fn forced_name(&self) -> Option<&str> {
        self.forced.as_deref()
    }

    pub fn character_collection(&self, identity: &str) -> Option<&str> {
        self.characters.get(identity).map(String::as_str)
    }

    pub fn characters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.characters
            .iter()
            .map(|(identity, name)| (identity.as_str(), name.as_str()))
    }

    /// The named collection, or the current one when `name` is `None`.
    pub fn target(&self, name: Option<&str>) -> Result<&Collection> {
        let name = name.unwrap_or(&self.current);
        self.collections
            .get(name)
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    pub fn target_mut(&mut self, name: Option<&str>) -> Result<&mut Collection> {
        let name = name.unwrap_or(&self.current).to_string();
        self.collections
            .get_mut(&name)
            .ok_or(Error::CollectionNotFound(name))
    }

    fn require(&self, name: &str) -> Result<()> {
        if self.collections.contains_key(name) {
            Ok(())
        } else {
            Err(Error::CollectionNotFound(name.to_string()))
        }
    }

    // ---------------------------------------------------------------------
    // Management
    // ---------------------------------------------------------------------

    /// Create a collection, empty or as a copy of `duplicate_from`.
    pub fn add_collection(&mut self, name: &str, duplicate_from: Option<&str>) -> Result<&Collection> {
        let name = name.trim();
        let key = collection_key(name);
        if key.is_empty() {
            return Err(Error::InvalidCollectionName(name.to_string()));
        }
        if self.collections.keys().any(|existing| collection_key(existing) == key) {
            return Err(Error::CollectionExists(name.to_string()));
        }

        let collection = match duplicate_from {
            Some(source) => {
                let source = self
                    .collections
                    .get(source)
                    .ok_or_else(|| Error::CollectionNotFound(source.to_string()))?;
                Collection::with_settings(name, source.settings().clone())
            }
            None => Collection::new(name),
        };

        tracing::info!(
            "Created collection '{}' with {} mod setting(s)",
            name,
            collection.settings().len()
        );
        let entry = self.collections.entry(name.to_string()).or_insert(collection);
        Ok(&*entry)
    }

    /// Delete a collection and clear every role bound to it.
    ///
    /// Current falls back to the default collection.
    pub fn remove_collection(&mut self, name: &str) -> Result<Collection> {
        if name == DEFAULT_COLLECTION {
            return Err(Error::CannotDeleteDefault);
        }
        let removed = self
            .collections
            .shift_remove(name)
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))?;

        if self.current == name {
            self.current = DEFAULT_COLLECTION.to_string();
        }
        if self.default_.as_deref() == Some(name) {
            self.default_ = None;
        }
        if self.forced.as_deref() == Some(name) {
            self.forced = None;
        }
        self.characters.retain(|_, bound| bound != name);

        tracing::info!("Deleted collection '{}'", name);
        Ok(removed)
    }

    pub fn set_current(&mut self, name: &str) -> Result<bool> {
        self.require(name)?;
        if self.current == name {
            return Ok(false);
        }
        self.current = name.to_string();
        tracing::info!("Current collection: {}", name);
        Ok(true)
    }

    /// Bind or unbind the default role.
    pub fn set_default(&mut self, name: Option<&str>) -> Result<bool> {
        if let Some(name) = name {
            self.require(name)?;
        }
        if self.default_.as_deref() == name {
            return Ok(false);
        }
        self.default_ = name.map(str::to_string);
        tracing::info!("Default collection: {}", name.unwrap_or("<none>"));
        Ok(true)
    }

    /// Bind or unbind the forced role.
    pub fn set_forced(&mut self, name: Option<&str>) -> Result<bool> {
        if let Some(name) = name {
            self.require(name)?;
        }
        if self.forced.as_deref() == name {
            return Ok(false);
        }
        self.forced = name.map(str::to_string);
        tracing::info!("Forced collection: {}", name.unwrap_or("<none>"));
        Ok(true)
    }

    /// Bind `identity` to a collection, or remove its binding with `None`.
    pub fn set_character_collection(&mut self, identity: &str, name: Option<&str>) -> Result<bool> {
        match name {
            Some(name) => {
                self.require(name)?;
                if self.characters.get(identity).map(String::as_str) == Some(name) {
                    return Ok(false);
                }
                self.characters
                    .insert(identity.to_string(), name.to_string());
                tracing::info!("Collection for {}: {}", identity, name);
                Ok(true)
            }
            None => Ok(self.remove_character_collection(identity)),
        }
    }

    pub fn remove_character_collection(&mut self, identity: &str) -> bool {
        let removed = self.characters.remove(identity).is_some();
        if removed {
            tracing::info!("Removed collection binding for {}", identity);
        }
        removed
    }

    /// Drop settings of uninstalled mods from one collection.
    pub fn cleanup<'a>(
        &mut self,
        name: &str,
        valid_identities: impl IntoIterator<Item = &'a str>,
    ) -> Result<bool> {
        let collection = self
            .collections
            .get_mut(name)
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))?;
        Ok(collection.cleanup(valid_identities))
    }

    /// Align every collection's settings for `descriptor` with its groups.
    ///
    /// Returns the names of the collections that changed.
    pub fn fix_groups(&mut self, descriptor: &ModDescriptor) -> Vec<String> {
        self.collections
            .values_mut()
            .filter_map(|collection| {
                collection
                    .fix_groups(descriptor)
                    .then(|| collection.name().to_string())
            })
            .collect()
    }

    // ---------------------------------------------------------------------
    // Caches
    // ---------------------------------------------------------------------

    /// Mark every cache stale, e.g. after a mod was added, removed or reloaded.
    pub fn invalidate_all(&mut self) {
        for collection in self.collections.values_mut() {
            collection.invalidate();
        }
    }

    /// Rebuild every dirty cache in parallel. Returns how many were rebuilt.
    pub fn refresh(&mut self, registry: &ModRegistry) -> usize {
        let dirty: Vec<&mut Collection> = self
            .collections
            .values_mut()
            .filter(|c| c.is_dirty())
            .collect();
        if dirty.is_empty() {
            return 0;
        }

        let count = dirty.len();
        dirty.into_par_iter().for_each(|collection| {
            collection.recompute(registry);
        });
        tracing::info!(
            "Recomputed {} collection(s) over {} mod(s)",
            count,
            registry.len()
        );
        count
    }

    pub fn conflicts(&self, name: Option<&str>) -> Result<&[Conflict]> {
        Ok(self.target(name)?.conflicts())
    }

    // ---------------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------------

    /// Resolve `path` for a requester.
    ///
    /// `None` means no redirect: the original asset is served.
    ///
    /// Answers come from each collection's last computed cache. Settings
    /// edits and [`invalidate_all`](Self::invalidate_all) only mark caches
    /// dirty; call [`refresh`](Self::refresh) before resolving to see them.
    /// [`ModManager`](crate::ModManager) does this after every operation.
    pub fn resolve(&self, path: &GamePath, identity: Option<&str>) -> Option<Redirect> {
        self.resolve_entry(path, identity)
            .map(|(_, entry)| entry.redirect.clone())
    }

    /// Like [`resolve`](Self::resolve), also reporting the owning mod and the
    /// link that answered.
    pub fn resolve_entry(
        &self,
        path: &GamePath,
        identity: Option<&str>,
    ) -> Option<(ResolveSource, &ResolvedEntry)> {
        let lookup = |name: Option<&String>| self.collections.get(name?.as_str());
        let character = identity.and_then(|id| self.characters.get(id));
        [
            (ResolveSource::Character, lookup(character)),
            (ResolveSource::Default, lookup(self.default_.as_ref())),
            (ResolveSource::Forced, lookup(self.forced.as_ref())),
        ]
        .into_iter()
        .find_map(|(source, collection)| collection?.resolve(path).map(|entry| (source, entry)))
    }

    /// Capture the current chain for lock-free reads on other threads.
    ///
    /// Like [`resolve`](Self::resolve), this captures the last computed
    /// caches; dirty collections need a [`refresh`](Self::refresh) first.
    pub fn snapshot(&self) -> ResolveSnapshot {
        let cache_of = |name: Option<&String>| {
            name.and_then(|name| self.collections.get(name))
                .map(Collection::cache)
        };
        ResolveSnapshot {
            characters: self
                .characters
                .iter()
                .filter_map(|(identity, name)| {
                    cache_of(Some(name)).map(|cache| (identity.clone(), cache))
                })
                .collect(),
            default_: cache_of(self.default_.as_ref()),
            forced: cache_of(self.forced.as_ref()),
        }
    }
}
