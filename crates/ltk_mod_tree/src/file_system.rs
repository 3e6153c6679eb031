//! The tree together with its persisted overrides and change listeners.
//!
//! [`ModFileSystem`] is what applications hold. Every public operation is one
//! logical change: it rewrites the overrides of the mods it touched, saves the
//! table at most once and notifies listeners exactly once.
//!
//! A failed save is returned after the change has been applied in memory and
//! listeners have been told about it; the next successful save writes the
//! whole table.

use crate::error::{Error, Result};
use crate::sort_order::{NullSortOrderStore, SortOrderStore, SortOrderTable};
use crate::tree::{sanitize_name, FolderId, ModTree};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A structural change, delivered to listeners after it is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeChange {
    /// The tree was rebuilt from a full mod list.
    Reloaded,
    ModAdded { identity: String },
    ModRemoved { identity: String },
    /// A mod was moved or renamed; `path` is its new full path.
    ModMoved { identity: String, path: String },
    FolderCreated { path: String },
    FolderRenamed { path: String },
    FolderMoved { path: String },
    /// A folder was merged away; `path` is the folder that received its children.
    FoldersMerged { path: String },
}

/// Callback invoked after each structural change.
pub type ChangeListener = Arc<dyn Fn(&TreeChange) + Send + Sync>;

pub struct ModFileSystem {
    tree: ModTree,
    overrides: SortOrderTable,
    display_names: HashMap<String, String>,
    store: Box<dyn SortOrderStore>,
    listeners: Vec<ChangeListener>,
}

impl std::fmt::Debug for ModFileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModFileSystem")
            .field("tree", &self.tree)
            .field("overrides", &self.overrides)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ModFileSystem {
    /// Create an empty file system that restores placements from `overrides`
    /// and writes changes to `store`.
    pub fn new(overrides: SortOrderTable, store: impl SortOrderStore + 'static) -> Self {
        Self {
            tree: ModTree::new(),
            overrides,
            display_names: HashMap::new(),
            store: Box::new(store),
            listeners: Vec::new(),
        }
    }

    /// A file system that keeps nothing on disk.
    pub fn in_memory() -> Self {
        Self::new(SortOrderTable::new(), NullSortOrderStore)
    }

    /// Register a listener for structural changes.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&TreeChange) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    pub fn tree(&self) -> &ModTree {
        &self.tree
    }

    pub fn overrides(&self) -> &SortOrderTable {
        &self.overrides
    }

    pub fn display_name(&self, identity: &str) -> Option<&str> {
        self.display_names.get(identity).map(String::as_str)
    }

    /// Resolve a slash-separated folder path.
    pub fn folder(&self, path: &str) -> Result<FolderId> {
        match self.tree.find(path) {
            (true, id) => Ok(id),
            (false, _) => Err(Error::PathNotFound(path.to_string())),
        }
    }

    /// Rebuild the tree from `(identity, display name)` pairs.
    ///
    /// Mods with an override are placed first so that restored placements win
    /// over default slots. Overrides of identities not in `mods` are dropped.
    /// Mods that cannot be placed at all are returned with the reason.
    pub fn load<I, A, B>(&mut self, mods: I) -> Result<Vec<(String, Error)>>
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        self.tree = ModTree::new();
        self.display_names = mods
            .into_iter()
            .map(|(identity, name)| (identity.into(), name.into()))
            .collect();

        let mut identities: Vec<String> = self.display_names.keys().cloned().collect();
        identities.sort_by_key(|identity| (self.overrides.get(identity).is_none(), identity.clone()));

        let mut rejected = Vec::new();
        for identity in identities {
            if let Err(err) = self.place(&identity) {
                tracing::warn!("Could not place mod {} in the tree: {}", identity, err);
                rejected.push((identity, err));
            }
        }

        let known: HashSet<&str> = self.display_names.keys().map(String::as_str).collect();
        let stale: Vec<String> = self
            .overrides
            .iter()
            .filter(|(identity, _)| !known.contains(identity))
            .map(|(identity, _)| identity.to_string())
            .collect();
        let mut changed = !stale.is_empty();
        for identity in stale {
            tracing::warn!("Dropping sort order of unknown mod {}", identity);
            self.overrides.remove(&identity);
        }

        let placed: Vec<String> = self.tree.all_mods(FolderId::ROOT, true);
        for identity in &placed {
            changed |= self.refresh_override(identity);
        }

        tracing::info!(
            "Loaded mod tree: {} mod(s), {} override(s), {} rejected",
            placed.len(),
            self.overrides.len(),
            rejected.len()
        );

        self.finish(changed, TreeChange::Reloaded)?;
        Ok(rejected)
    }

    /// Register one mod, restoring its override if it has one.
    pub fn add_mod(&mut self, identity: &str, display_name: &str) -> Result<()> {
        if self.tree.contains_mod(identity) {
            return Err(Error::DuplicateMod(identity.to_string()));
        }
        self.display_names
            .insert(identity.to_string(), display_name.to_string());
        if let Err(err) = self.place(identity) {
            self.display_names.remove(identity);
            return Err(err);
        }

        let changed = self.refresh_override(identity);
        self.finish(
            changed,
            TreeChange::ModAdded {
                identity: identity.to_string(),
            },
        )
    }

    /// Remove a mod from the tree. Its override is kept so a later re-add
    /// lands in the same place.
    pub fn remove_mod(&mut self, identity: &str) -> bool {
        if !self.tree.remove_mod(identity) {
            return false;
        }
        self.display_names.remove(identity);
        self.emit(&TreeChange::ModRemoved {
            identity: identity.to_string(),
        });
        true
    }

    /// Follow a display name change.
    ///
    /// A mod in its default slot is renamed along with its display name; a
    /// mod the user has placed keeps its placement.
    pub fn set_display_name(&mut self, identity: &str, display_name: &str) -> Result<bool> {
        let previous = self
            .display_names
            .insert(identity.to_string(), display_name.to_string());
        if previous.as_deref() == Some(display_name) {
            return Ok(false);
        }

        let mut moved = false;
        if self.overrides.get(identity).is_none() {
            match self.tree.rename_mod(identity, display_name) {
                Ok(renamed) => moved = renamed,
                Err(Error::NameCollision { .. }) => tracing::warn!(
                    "Keeping the current leaf name of {}; '{}' is taken",
                    identity,
                    display_name
                ),
                Err(err) => return Err(err),
            }
        }

        let changed = self.refresh_override(identity);
        if moved || changed {
            let path = self.tree.full_path(identity).unwrap_or_default();
            self.finish(
                changed,
                TreeChange::ModMoved {
                    identity: identity.to_string(),
                    path,
                },
            )?;
        }
        Ok(moved)
    }

    pub fn rename_mod(&mut self, identity: &str, new_name: &str) -> Result<bool> {
        let changed = self.tree.rename_mod(identity, new_name)?;
        if changed {
            self.commit_mod(identity)?;
        }
        Ok(changed)
    }

    pub fn move_mod(&mut self, identity: &str, target: FolderId) -> Result<bool> {
        let changed = self.tree.move_mod(identity, target)?;
        if changed {
            self.commit_mod(identity)?;
        }
        Ok(changed)
    }

    pub fn move_mod_to_path(&mut self, identity: &str, path: &str) -> Result<bool> {
        let changed = self.tree.move_mod_to_path(identity, path)?;
        if changed {
            self.commit_mod(identity)?;
        }
        Ok(changed)
    }

    /// Create every folder along `path`.
    pub fn create_folder(&mut self, path: &str) -> Result<FolderId> {
        let (id, created) = self.tree.create_folder_path(path)?;
        if created {
            let path = self.tree.folder_path(id).unwrap_or_default();
            self.emit(&TreeChange::FolderCreated { path });
        }
        Ok(id)
    }

    pub fn rename_folder(&mut self, id: FolderId, new_name: &str) -> Result<bool> {
        let parent = self.tree.parent(id);
        if !self.tree.rename_folder(id, new_name)? {
            return Ok(false);
        }
        // The tree stores the sanitized name, which is also where a merge lands
        let name = sanitize_name(new_name);
        let result = parent.and_then(|parent| self.tree.find_sub_folder(parent, &name));
        self.commit_folder(result, |path| TreeChange::FolderRenamed { path })?;
        Ok(true)
    }

    pub fn move_folder(&mut self, id: FolderId, target: FolderId) -> Result<bool> {
        let name = self.tree.folder_name(id).map(str::to_string);
        if !self.tree.move_folder(id, target)? {
            return Ok(false);
        }
        let result = name.and_then(|name| self.tree.find_sub_folder(target, &name));
        self.commit_folder(result, |path| TreeChange::FolderMoved { path })?;
        Ok(true)
    }

    pub fn merge(&mut self, source: FolderId, target: FolderId) -> Result<bool> {
        if !self.tree.merge(source, target)? {
            return Ok(false);
        }
        let result = self.tree.contains_folder(target).then_some(target);
        self.commit_folder(result, |path| TreeChange::FoldersMerged { path })?;
        Ok(true)
    }

    /// Put a registered mod into the tree: at its override path when it has
    /// one, otherwise at the root under its display name, falling back to its
    /// identity when the name is taken.
    fn place(&mut self, identity: &str) -> Result<()> {
        if let Some(path) = self.overrides.get(identity).map(str::to_string) {
            match self.tree.add_mod_at_path(identity, &path) {
                Ok(()) => return Ok(()),
                Err(err) => tracing::warn!(
                    "Could not restore mod {} at '{}': {}",
                    identity,
                    path,
                    err
                ),
            }
        }

        let display_name = match self.display_names.get(identity) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => identity.to_string(),
        };
        match self.tree.add_mod(identity, FolderId::ROOT, &display_name) {
            Err(Error::NameCollision { .. }) if display_name != identity => {
                tracing::warn!(
                    "Name '{}' is taken, placing mod under its identity {}",
                    display_name,
                    identity
                );
                self.tree.add_mod(identity, FolderId::ROOT, identity)
            }
            result => result,
        }
    }

    fn refresh_override(&mut self, identity: &str) -> bool {
        let Some(path) = self.tree.full_path(identity) else {
            return false;
        };
        let display_name = self
            .display_names
            .get(identity)
            .map(String::as_str)
            .unwrap_or(identity);
        self.overrides.update(identity, &path, display_name)
    }

    fn commit_mod(&mut self, identity: &str) -> Result<()> {
        let changed = self.refresh_override(identity);
        let path = self.tree.full_path(identity).unwrap_or_default();
        self.finish(
            changed,
            TreeChange::ModMoved {
                identity: identity.to_string(),
                path,
            },
        )
    }

    fn commit_folder(
        &mut self,
        folder: Option<FolderId>,
        change: impl FnOnce(String) -> TreeChange,
    ) -> Result<()> {
        let mut changed = false;
        let mut path = String::new();
        if let Some(folder) = folder {
            for identity in self.tree.all_mods(folder, true) {
                changed |= self.refresh_override(&identity);
            }
            path = self.tree.folder_path(folder).unwrap_or_default();
        }
        self.finish(changed, change(path))
    }

    /// Save once if anything changed, then notify once.
    fn finish(&mut self, changed: bool, change: TreeChange) -> Result<()> {
        let saved = if changed {
            self.store.save(&self.overrides)
        } else {
            Ok(())
        };
        self.emit(&change);
        saved
    }

    fn emit(&self, change: &TreeChange) {
        tracing::debug!("Tree change: {:?}", change);
        for listener in &self.listeners {
            listener(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort_order::JsonSortOrderStore;
    use camino::Utf8PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct CountingStore {
        saves: Arc<AtomicUsize>,
        last: Arc<Mutex<SortOrderTable>>,
    }

    impl SortOrderStore for CountingStore {
        fn save(&mut self, table: &SortOrderTable) -> Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = table.clone();
            Ok(())
        }
    }

    fn recording(fs: &mut ModFileSystem) -> Arc<Mutex<Vec<TreeChange>>> {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = changes.clone();
        fs.subscribe(move |change| sink.lock().unwrap().push(change.clone()));
        changes
    }

    fn mods() -> Vec<(&'static str, &'static str)> {
        vec![
            ("crimson", "Crimson"),
            ("azure", "Azure"),
            ("clean_ui", "Clean UI"),
        ]
    }

    #[test]
    fn test_load_places_mods_at_root() {
        let mut fs = ModFileSystem::in_memory();
        let rejected = fs.load(mods()).unwrap();

        assert!(rejected.is_empty());
        assert_eq!(fs.tree().full_path("crimson").as_deref(), Some("Crimson"));
        assert_eq!(fs.tree().mod_count(), 3);
        assert!(fs.overrides().is_empty());
    }

    #[test]
    fn test_load_restores_overrides_and_drops_unknown() {
        let mut overrides = SortOrderTable::new();
        overrides.update("crimson", "Outfits/Red/Crimson", "Crimson");
        overrides.update("gone", "Old/Gone", "Gone");
        let store = CountingStore::default();
        let mut fs = ModFileSystem::new(overrides, store.clone());
        let changes = recording(&mut fs);

        fs.load(mods()).unwrap();

        assert_eq!(
            fs.tree().full_path("crimson").as_deref(),
            Some("Outfits/Red/Crimson")
        );
        assert_eq!(fs.overrides().get("gone"), None);
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
        assert_eq!(*changes.lock().unwrap(), vec![TreeChange::Reloaded]);
    }

    #[test]
    fn test_name_collision_falls_back_to_identity() {
        let mut fs = ModFileSystem::in_memory();
        let rejected = fs
            .load([("first", "Same Name"), ("second", "same name")])
            .unwrap();

        assert!(rejected.is_empty());
        let mut paths = vec![
            fs.tree().full_path("first").unwrap(),
            fs.tree().full_path("second").unwrap(),
        ];
        paths.sort();
        assert_eq!(paths, vec!["Same Name", "second"]);
        // The fallback slot differs from the display name, so it is recorded
        assert_eq!(fs.overrides().get("second"), Some("second"));
    }

    #[test]
    fn test_collision_with_identity_is_rejected() {
        let mut fs = ModFileSystem::in_memory();
        fs.load([("taken", "Taken")]).unwrap();

        let result = fs.add_mod("taken2", "taken");
        assert!(result.is_ok());
        let result = fs.add_mod("TAKEN2", "Taken");
        assert!(matches!(result, Err(Error::NameCollision { .. })));
        assert!(!fs.tree().contains_mod("TAKEN2"));
        assert_eq!(fs.display_name("TAKEN2"), None);
    }

    #[test]
    fn test_move_persists_once_and_notifies_once() {
        let store = CountingStore::default();
        let mut fs = ModFileSystem::new(SortOrderTable::new(), store.clone());
        fs.load(mods()).unwrap();
        let changes = recording(&mut fs);
        let saves_before = store.saves.load(Ordering::SeqCst);

        assert!(fs.move_mod_to_path("crimson", "Outfits/Crimson").unwrap());

        assert_eq!(store.saves.load(Ordering::SeqCst), saves_before + 1);
        assert_eq!(
            *changes.lock().unwrap(),
            vec![TreeChange::ModMoved {
                identity: "crimson".to_string(),
                path: "Outfits/Crimson".to_string()
            }]
        );
        assert_eq!(
            store.last.lock().unwrap().get("crimson"),
            Some("Outfits/Crimson")
        );
    }

    #[test]
    fn test_folder_rename_rewrites_all_affected_overrides() {
        let store = CountingStore::default();
        let mut fs = ModFileSystem::new(SortOrderTable::new(), store.clone());
        fs.load(mods()).unwrap();
        fs.move_mod_to_path("crimson", "Outfits/Crimson").unwrap();
        fs.move_mod_to_path("azure", "Outfits/Azure").unwrap();
        let changes = recording(&mut fs);
        let saves_before = store.saves.load(Ordering::SeqCst);

        let outfits = fs.folder("outfits").unwrap();
        assert!(fs.rename_folder(outfits, "Skins").unwrap());

        assert_eq!(store.saves.load(Ordering::SeqCst), saves_before + 1);
        assert_eq!(fs.overrides().get("crimson"), Some("Skins/Crimson"));
        assert_eq!(fs.overrides().get("azure"), Some("Skins/Azure"));
        assert_eq!(
            *changes.lock().unwrap(),
            vec![TreeChange::FolderRenamed {
                path: "Skins".to_string()
            }]
        );
    }

    #[test]
    fn test_folder_rename_with_separator_rewrites_overrides() {
        let store = CountingStore::default();
        let mut fs = ModFileSystem::new(SortOrderTable::new(), store.clone());
        fs.load(mods()).unwrap();
        fs.move_mod_to_path("crimson", "Outfits/Crimson").unwrap();
        let changes = recording(&mut fs);
        let saves_before = store.saves.load(Ordering::SeqCst);

        let outfits = fs.folder("Outfits").unwrap();
        assert!(fs.rename_folder(outfits, "Red/Blue").unwrap());

        let path = fs.tree().full_path("crimson").unwrap();
        assert_eq!(path, "Red\\Blue/Crimson");
        assert_eq!(fs.overrides().get("crimson"), Some(path.as_str()));
        assert_eq!(
            store.last.lock().unwrap().get("crimson"),
            Some(path.as_str())
        );
        assert_eq!(store.saves.load(Ordering::SeqCst), saves_before + 1);
        assert_eq!(
            *changes.lock().unwrap(),
            vec![TreeChange::FolderRenamed {
                path: "Red\\Blue".to_string()
            }]
        );
    }

    #[test]
    fn test_folder_rename_into_sibling_rewrites_overrides() {
        let mut fs = ModFileSystem::in_memory();
        fs.load(mods()).unwrap();
        fs.move_mod_to_path("crimson", "Outfits/Crimson").unwrap();
        fs.move_mod_to_path("azure", "Skins/Azure").unwrap();

        let outfits = fs.folder("Outfits").unwrap();
        assert!(fs.rename_folder(outfits, "skins").unwrap());

        assert_eq!(fs.overrides().get("crimson"), Some("Skins/Crimson"));
        assert_eq!(fs.overrides().get("azure"), Some("Skins/Azure"));
        assert!(fs.folder("Outfits").is_err());
    }

    #[test]
    fn test_folder_move_rewrites_overrides() {
        let store = CountingStore::default();
        let mut fs = ModFileSystem::new(SortOrderTable::new(), store.clone());
        fs.load(mods()).unwrap();
        fs.move_mod_to_path("crimson", "Outfits/Crimson").unwrap();
        fs.move_mod_to_path("azure", "Archive/Azure").unwrap();
        let changes = recording(&mut fs);
        let saves_before = store.saves.load(Ordering::SeqCst);

        let outfits = fs.folder("Outfits").unwrap();
        let archive = fs.folder("Archive").unwrap();
        assert!(fs.move_folder(outfits, archive).unwrap());

        assert_eq!(
            fs.overrides().get("crimson"),
            Some("Archive/Outfits/Crimson")
        );
        assert_eq!(fs.overrides().get("azure"), Some("Archive/Azure"));
        assert_eq!(store.saves.load(Ordering::SeqCst), saves_before + 1);
        assert_eq!(
            *changes.lock().unwrap(),
            vec![TreeChange::FolderMoved {
                path: "Archive/Outfits".to_string()
            }]
        );
    }

    #[test]
    fn test_merge_rewrites_overrides() {
        let store = CountingStore::default();
        let mut fs = ModFileSystem::new(SortOrderTable::new(), store.clone());
        fs.load(mods()).unwrap();
        fs.move_mod_to_path("crimson", "Outfits/Crimson").unwrap();
        fs.move_mod_to_path("azure", "Skins/Azure").unwrap();
        let changes = recording(&mut fs);
        let saves_before = store.saves.load(Ordering::SeqCst);

        let outfits = fs.folder("Outfits").unwrap();
        let skins = fs.folder("Skins").unwrap();
        assert!(fs.merge(outfits, skins).unwrap());

        assert!(fs.folder("Outfits").is_err());
        assert_eq!(fs.overrides().get("crimson"), Some("Skins/Crimson"));
        assert_eq!(
            store.last.lock().unwrap().get("crimson"),
            Some("Skins/Crimson")
        );
        assert_eq!(store.saves.load(Ordering::SeqCst), saves_before + 1);
        assert_eq!(
            *changes.lock().unwrap(),
            vec![TreeChange::FoldersMerged {
                path: "Skins".to_string()
            }]
        );
    }

    #[test]
    fn test_failed_operation_does_not_notify() {
        let mut fs = ModFileSystem::in_memory();
        fs.load(mods()).unwrap();
        let changes = recording(&mut fs);

        let result = fs.rename_mod("crimson", "azure");
        assert!(matches!(result, Err(Error::NameCollision { .. })));
        assert!(changes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_removed_mod_keeps_override() {
        let mut fs = ModFileSystem::in_memory();
        fs.load(mods()).unwrap();
        fs.move_mod_to_path("crimson", "Outfits/Crimson").unwrap();

        assert!(fs.remove_mod("crimson"));
        assert!(fs.folder("Outfits").is_err());
        assert_eq!(fs.overrides().get("crimson"), Some("Outfits/Crimson"));

        fs.add_mod("crimson", "Crimson").unwrap();
        assert_eq!(
            fs.tree().full_path("crimson").as_deref(),
            Some("Outfits/Crimson")
        );
    }

    #[test]
    fn test_moving_back_to_default_slot_drops_override() {
        let mut fs = ModFileSystem::in_memory();
        fs.load(mods()).unwrap();
        fs.move_mod_to_path("crimson", "Outfits/Crimson").unwrap();
        fs.move_mod("crimson", FolderId::ROOT).unwrap();
        assert_eq!(fs.overrides().get("crimson"), None);
    }

    #[test]
    fn test_display_name_change_follows_default_slot() {
        let mut fs = ModFileSystem::in_memory();
        fs.load(mods()).unwrap();
        fs.move_mod_to_path("azure", "Outfits/Azure").unwrap();

        assert!(fs.set_display_name("crimson", "Crimson v2").unwrap());
        assert_eq!(fs.tree().full_path("crimson").as_deref(), Some("Crimson v2"));

        // Placed by the user: placement stays
        assert!(!fs.set_display_name("azure", "Azure v2").unwrap());
        assert_eq!(fs.tree().full_path("azure").as_deref(), Some("Outfits/Azure"));
    }

    #[test]
    fn test_json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("sort_order.json")).unwrap();

        let store = JsonSortOrderStore::new(path.clone());
        let mut fs = ModFileSystem::new(store.load().unwrap(), store);
        fs.load(mods()).unwrap();
        fs.move_mod_to_path("clean_ui", "Interface/Clean UI").unwrap();

        let store = JsonSortOrderStore::new(path);
        let mut reloaded = ModFileSystem::new(store.load().unwrap(), store);
        reloaded.load(mods()).unwrap();
        assert_eq!(
            reloaded.tree().full_path("clean_ui").as_deref(),
            Some("Interface/Clean UI")
        );
    }
}
