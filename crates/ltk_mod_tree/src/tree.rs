//! Arena-backed folder tree.
//!
//! Folders live in a flat arena and point at their parent by [`FolderId`];
//! children are kept in case-insensitive maps so sibling names stay unique no
//! matter how they are spelled. Ids are never reused, so a stale id simply
//! stops resolving once its folder is removed.

use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};

/// Handle to a folder in a [`ModTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderId(usize);

impl FolderId {
    pub const ROOT: FolderId = FolderId(0);

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

/// Where a mod sits in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortOrder {
    pub folder: FolderId,
    /// Leaf name, as spelled by the user.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Folder {
    name: String,
    parent: Option<FolderId>,
    /// Lowercased name -> folder.
    sub_folders: BTreeMap<String, FolderId>,
    /// Lowercased leaf name -> mod identity.
    mods: BTreeMap<String, String>,
}

impl Folder {
    fn new(name: String) -> Self {
        Self {
            name,
            parent: None,
            sub_folders: BTreeMap::new(),
            mods: BTreeMap::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.sub_folders.is_empty() && self.mods.is_empty()
    }

    fn has_child(&self, key: &str) -> bool {
        self.sub_folders.contains_key(key) || self.mods.contains_key(key)
    }
}

/// Names may not contain the path separator; it is replaced with a backslash.
pub fn sanitize_name(name: &str) -> String {
    name.replace('/', "\\")
}

fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// A virtual folder hierarchy whose leaves are mod identities.
///
/// The tree only organizes mods; it never affects which files get resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModTree {
    folders: Vec<Option<Folder>>,
    leaves: HashMap<String, SortOrder>,
}

impl Default for ModTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ModTree {
    pub fn new() -> Self {
        Self {
            folders: vec![Some(Folder::new(String::new()))],
            leaves: HashMap::new(),
        }
    }

    fn get(&self, id: FolderId) -> Result<&Folder> {
        self.folders
            .get(id.0)
            .and_then(|f| f.as_ref())
            .ok_or(Error::FolderNotFound(id))
    }

    fn get_mut(&mut self, id: FolderId) -> Result<&mut Folder> {
        self.folders
            .get_mut(id.0)
            .and_then(|f| f.as_mut())
            .ok_or(Error::FolderNotFound(id))
    }

    fn collision(&self, folder: FolderId, name: &str) -> Error {
        Error::NameCollision {
            folder: self.folder_path(folder).unwrap_or_default(),
            name: name.to_string(),
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn contains_folder(&self, id: FolderId) -> bool {
        self.get(id).is_ok()
    }

    pub fn folder_name(&self, id: FolderId) -> Option<&str> {
        self.get(id).ok().map(|f| f.name.as_str())
    }

    pub fn parent(&self, id: FolderId) -> Option<FolderId> {
        self.get(id).ok().and_then(|f| f.parent)
    }

    /// Sub-folders of `id`, ordered by name.
    pub fn sub_folders(&self, id: FolderId) -> Vec<FolderId> {
        self.get(id)
            .map(|f| f.sub_folders.values().copied().collect())
            .unwrap_or_default()
    }

    /// Identities of the mods directly inside `id`, ordered by leaf name.
    pub fn mods_in(&self, id: FolderId) -> Vec<&str> {
        self.get(id)
            .map(|f| f.mods.values().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Every live folder, root first.
    pub fn folder_ids(&self) -> Vec<FolderId> {
        self.folders
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_some())
            .map(|(idx, _)| FolderId(idx))
            .collect()
    }

    pub fn find_sub_folder(&self, parent: FolderId, name: &str) -> Option<FolderId> {
        self.get(parent)
            .ok()?
            .sub_folders
            .get(&name_key(name))
            .copied()
    }

    /// Walk `path` from the root.
    ///
    /// Returns `(true, folder)` when every segment exists, otherwise `false`
    /// with the deepest folder that did.
    pub fn find(&self, path: &str) -> (bool, FolderId) {
        let mut folder = FolderId::ROOT;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            match self.find_sub_folder(folder, segment) {
                Some(sub) => folder = sub,
                None => return (false, folder),
            }
        }
        (true, folder)
    }

    /// Slash-joined folder names from the root; the root itself is `""`.
    pub fn folder_path(&self, id: FolderId) -> Option<String> {
        let mut parts = Vec::new();
        let mut current = id;
        loop {
            let folder = self.get(current).ok()?;
            match folder.parent {
                Some(parent) => {
                    parts.push(folder.name.as_str());
                    current = parent;
                }
                None => break,
            }
        }
        parts.reverse();
        Some(parts.join("/"))
    }

    pub fn sort_order(&self, identity: &str) -> Option<&SortOrder> {
        self.leaves.get(identity)
    }

    pub fn contains_mod(&self, identity: &str) -> bool {
        self.leaves.contains_key(identity)
    }

    pub fn mod_count(&self) -> usize {
        self.leaves.len()
    }

    /// Full virtual path of a mod: its folder path plus its leaf name.
    pub fn full_path(&self, identity: &str) -> Option<String> {
        let order = self.leaves.get(identity)?;
        let folder = self.folder_path(order.folder)?;
        if folder.is_empty() {
            Some(order.name.clone())
        } else {
            Some(format!("{}/{}", folder, order.name))
        }
    }

    /// Mods inside `id`, optionally including every nested folder.
    pub fn all_mods(&self, id: FolderId, recursive: bool) -> Vec<String> {
        let mut result = Vec::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Ok(folder) = self.get(current) else {
                continue;
            };
            result.extend(folder.mods.values().cloned());
            if recursive {
                pending.extend(folder.sub_folders.values().rev().copied());
            }
        }
        result
    }

    /// Whether `id` lies strictly below `ancestor`.
    pub fn is_descendant(&self, id: FolderId, ancestor: FolderId) -> bool {
        let mut current = self.parent(id);
        while let Some(folder) = current {
            if folder == ancestor {
                return true;
            }
            current = self.parent(folder);
        }
        false
    }

    // ---------------------------------------------------------------------
    // Linking primitives (no validation, no pruning)
    // ---------------------------------------------------------------------

    fn link_mod(&mut self, identity: &str, folder: FolderId, name: String) -> Result<()> {
        self.get_mut(folder)?
            .mods
            .insert(name_key(&name), identity.to_string());
        self.leaves
            .insert(identity.to_string(), SortOrder { folder, name });
        Ok(())
    }

    fn unlink_mod(&mut self, identity: &str) -> Result<SortOrder> {
        let order = self
            .leaves
            .remove(identity)
            .ok_or_else(|| Error::ModNotFound(identity.to_string()))?;
        self.get_mut(order.folder)?.mods.remove(&name_key(&order.name));
        Ok(order)
    }

    fn link_folder(&mut self, id: FolderId, parent: FolderId) -> Result<()> {
        let key = name_key(&self.get(id)?.name);
        self.get_mut(parent)?.sub_folders.insert(key, id);
        self.get_mut(id)?.parent = Some(parent);
        Ok(())
    }

    fn unlink_folder(&mut self, id: FolderId) -> Result<()> {
        let (key, parent) = {
            let folder = self.get(id)?;
            (name_key(&folder.name), folder.parent)
        };
        if let Some(parent) = parent {
            self.get_mut(parent)?.sub_folders.remove(&key);
        }
        self.get_mut(id)?.parent = None;
        Ok(())
    }

    /// Remove `id` and then each ancestor for as long as they are empty.
    fn prune(&mut self, mut id: FolderId) {
        while !id.is_root() {
            let Ok(folder) = self.get(id) else {
                return;
            };
            if !folder.is_empty() {
                return;
            }
            let parent = folder.parent;
            tracing::debug!("Pruning empty folder '{}'", folder.name);
            if self.unlink_folder(id).is_err() {
                return;
            }
            self.folders[id.0] = None;
            match parent {
                Some(parent) => id = parent,
                None => return,
            }
        }
    }

    // ---------------------------------------------------------------------
    // Folder operations
    // ---------------------------------------------------------------------

    /// Get the sub-folder `name` of `parent`, creating it if needed.
    ///
    /// Returns the folder and whether it was created.
    pub fn find_or_create_folder(&mut self, parent: FolderId, name: &str) -> Result<(FolderId, bool)> {
        let name = sanitize_name(name);
        if name.is_empty() {
            return Err(Error::InvalidName(name));
        }
        let key = name_key(&name);
        let folder = self.get(parent)?;
        if let Some(&existing) = folder.sub_folders.get(&key) {
            return Ok((existing, false));
        }
        if folder.mods.contains_key(&key) {
            return Err(self.collision(parent, &name));
        }

        let id = FolderId(self.folders.len());
        self.folders.push(Some(Folder::new(name)));
        self.link_folder(id, parent)?;
        Ok((id, true))
    }

    /// Create every folder along a slash-separated path.
    pub fn create_folder_path(&mut self, path: &str) -> Result<(FolderId, bool)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(Error::InvalidName(path.to_string()));
        }
        self.check_folder_chain(&segments)?;

        let mut folder = FolderId::ROOT;
        let mut created = false;
        for segment in segments {
            let (next, new) = self.find_or_create_folder(folder, segment)?;
            folder = next;
            created |= new;
        }
        Ok((folder, created))
    }

    /// Fail if walking `segments` from the root would hit a mod.
    ///
    /// Returns the deepest existing folder, or `None` once the walk leaves the
    /// existing tree.
    fn check_folder_chain(&self, segments: &[&str]) -> Result<Option<FolderId>> {
        let mut current = Some(FolderId::ROOT);
        for segment in segments {
            let Some(id) = current else {
                break;
            };
            let key = name_key(segment);
            let folder = self.get(id)?;
            if folder.mods.contains_key(&key) {
                return Err(self.collision(id, segment));
            }
            current = folder.sub_folders.get(&key).copied();
        }
        Ok(current)
    }

    /// Rename a folder.
    ///
    /// Renaming onto an existing sibling folder merges the two. A change that
    /// only affects letter case renames in place.
    ///
    /// # Panics
    ///
    /// Panics when `id` is the root.
    pub fn rename_folder(&mut self, id: FolderId, new_name: &str) -> Result<bool> {
        assert!(!id.is_root(), "cannot rename the root folder");

        let name = sanitize_name(new_name);
        if name.is_empty() {
            return Err(Error::InvalidName(new_name.to_string()));
        }
        let folder = self.get(id)?;
        if folder.name == name {
            return Ok(false);
        }
        let parent = folder.parent.ok_or(Error::FolderNotFound(id))?;
        let key = name_key(&name);

        let siblings = self.get(parent)?;
        match siblings.sub_folders.get(&key).copied() {
            Some(existing) if existing != id => return self.merge(id, existing),
            Some(_) => {
                self.get_mut(id)?.name = name;
                return Ok(true);
            }
            None => {}
        }
        if siblings.mods.contains_key(&key) {
            return Err(self.collision(parent, &name));
        }

        self.unlink_folder(id)?;
        self.get_mut(id)?.name = name;
        self.link_folder(id, parent)?;
        Ok(true)
    }

    /// Move a folder under `target`.
    ///
    /// If `target` already has a folder of the same name, the two merge.
    /// Moving a folder onto itself or its current parent does nothing.
    ///
    /// # Panics
    ///
    /// Panics when `id` is the root.
    pub fn move_folder(&mut self, id: FolderId, target: FolderId) -> Result<bool> {
        assert!(!id.is_root(), "cannot move the root folder");

        if id == target {
            return Ok(false);
        }
        let (key, name, old_parent) = {
            let folder = self.get(id)?;
            (name_key(&folder.name), folder.name.clone(), folder.parent)
        };
        let destination = self.get(target)?;
        if old_parent == Some(target) {
            return Ok(false);
        }
        if self.is_descendant(target, id) {
            return Err(Error::FolderCycle(self.folder_path(id).unwrap_or(name)));
        }
        if destination.mods.contains_key(&key) {
            return Err(self.collision(target, &name));
        }
        if let Some(&existing) = destination.sub_folders.get(&key) {
            self.check_merge(id, existing, id)?;
        }

        self.move_folder_unchecked(id, target)?;
        if let Some(parent) = old_parent {
            self.prune(parent);
        }
        Ok(true)
    }

    /// Move every child of `source` into `target` and delete `source`.
    ///
    /// Sub-folders with matching names merge recursively. Returns whether
    /// anything changed.
    pub fn merge(&mut self, source: FolderId, target: FolderId) -> Result<bool> {
        if source == target {
            return Ok(false);
        }
        self.get(target)?;
        let parent = self.get(source)?.parent;
        if self.is_descendant(target, source) || source.is_root() {
            return Err(Error::FolderCycle(
                self.folder_path(source).unwrap_or_default(),
            ));
        }
        self.check_merge(source, target, source)?;

        let changed = self.merge_unchecked(source, target)?;
        if let Some(parent) = parent {
            self.prune(parent);
        }
        Ok(changed)
    }

    /// Fail if merging `source` into `target` would put two mods, or a mod
    /// and a folder, under the same name.
    ///
    /// `detached` is the folder being merged away; it is unlinked before its
    /// children move, so it never counts as an occupant on the target side.
    fn check_merge(&self, source: FolderId, target: FolderId, detached: FolderId) -> Result<()> {
        let from = self.get(source)?;
        let into = self.get(target)?;
        let occupied_by_folder = |key: &str| {
            into.sub_folders
                .get(key)
                .copied()
                .filter(|&existing| existing != detached)
        };

        for (key, identity) in &from.mods {
            if into.mods.contains_key(key) || occupied_by_folder(key).is_some() {
                let name = self
                    .leaves
                    .get(identity)
                    .map(|order| order.name.clone())
                    .unwrap_or_else(|| key.clone());
                return Err(self.collision(target, &name));
            }
        }
        for (key, &sub) in &from.sub_folders {
            if into.mods.contains_key(key) {
                let name = self.folder_name(sub).unwrap_or(key).to_string();
                return Err(self.collision(target, &name));
            }
            if let Some(existing) = occupied_by_folder(key) {
                self.check_merge(sub, existing, detached)?;
            }
        }
        Ok(())
    }

    fn merge_unchecked(&mut self, source: FolderId, target: FolderId) -> Result<bool> {
        let (sub_folders, mods, parent) = {
            let folder = self.get(source)?;
            (
                folder.sub_folders.values().copied().collect::<Vec<_>>(),
                folder.mods.values().cloned().collect::<Vec<_>>(),
                folder.parent,
            )
        };

        if parent.is_some() {
            self.unlink_folder(source)?;
        }

        let mut changed = false;
        for sub in sub_folders {
            self.move_folder_unchecked(sub, target)?;
            changed = true;
        }
        for identity in mods {
            let order = self.unlink_mod(&identity)?;
            self.link_mod(&identity, target, order.name)?;
            changed = true;
        }

        self.folders[source.0] = None;
        Ok(changed || parent.is_some())
    }

    fn move_folder_unchecked(&mut self, id: FolderId, target: FolderId) -> Result<()> {
        let key = name_key(&self.get(id)?.name);
        let existing = self.get(target)?.sub_folders.get(&key).copied();
        self.unlink_folder(id)?;
        match existing {
            Some(existing) => {
                self.merge_unchecked(id, existing)?;
            }
            None => self.link_folder(id, target)?,
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Mod operations
    // ---------------------------------------------------------------------

    /// Place a new mod in `folder` under `name`.
    pub fn add_mod(&mut self, identity: &str, folder: FolderId, name: &str) -> Result<()> {
        if self.leaves.contains_key(identity) {
            return Err(Error::DuplicateMod(identity.to_string()));
        }
        let name = sanitize_name(name);
        if name.is_empty() {
            return Err(Error::InvalidName(name));
        }
        if self.get(folder)?.has_child(&name_key(&name)) {
            return Err(self.collision(folder, &name));
        }
        self.link_mod(identity, folder, name)
    }

    /// Place a new mod at a full slash-separated path, creating folders as
    /// needed. The last segment becomes the leaf name.
    pub fn add_mod_at_path(&mut self, identity: &str, path: &str) -> Result<()> {
        if self.leaves.contains_key(identity) {
            return Err(Error::DuplicateMod(identity.to_string()));
        }
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((leaf, folders)) = segments.split_last() else {
            return Err(Error::InvalidName(path.to_string()));
        };
        if let Some(existing) = self.check_folder_chain(folders)? {
            if self.get(existing)?.has_child(&name_key(&sanitize_name(leaf))) {
                return Err(self.collision(existing, leaf));
            }
        }

        let mut folder = FolderId::ROOT;
        for segment in folders {
            folder = self.find_or_create_folder(folder, segment)?.0;
        }
        self.link_mod(identity, folder, sanitize_name(leaf))
    }

    /// Remove a mod, pruning folders it leaves empty.
    pub fn remove_mod(&mut self, identity: &str) -> bool {
        match self.unlink_mod(identity) {
            Ok(order) => {
                self.prune(order.folder);
                true
            }
            Err(_) => false,
        }
    }

    /// Change a mod's leaf name without moving it.
    pub fn rename_mod(&mut self, identity: &str, new_name: &str) -> Result<bool> {
        let folder = self
            .leaves
            .get(identity)
            .map(|order| order.folder)
            .ok_or_else(|| Error::ModNotFound(identity.to_string()))?;
        self.relocate_mod(identity, folder, new_name)
    }

    /// Move a mod into `target`, keeping its leaf name.
    pub fn move_mod(&mut self, identity: &str, target: FolderId) -> Result<bool> {
        let order = self
            .leaves
            .get(identity)
            .cloned()
            .ok_or_else(|| Error::ModNotFound(identity.to_string()))?;
        if order.folder == target {
            return Ok(false);
        }
        self.relocate_mod(identity, target, &order.name)
    }

    /// Place a mod at a full slash-separated path, creating folders as needed.
    ///
    /// The last segment becomes the leaf name.
    pub fn move_mod_to_path(&mut self, identity: &str, path: &str) -> Result<bool> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((leaf, folders)) = segments.split_last() else {
            return Err(Error::InvalidName(path.to_string()));
        };
        let order = self
            .leaves
            .get(identity)
            .cloned()
            .ok_or_else(|| Error::ModNotFound(identity.to_string()))?;

        if let Some(existing) = self.check_folder_chain(folders)? {
            let key = name_key(&sanitize_name(leaf));
            let own_slot = order.folder == existing && name_key(&order.name) == key;
            if !own_slot && self.get(existing)?.has_child(&key) {
                return Err(self.collision(existing, leaf));
            }
        }

        let mut folder = FolderId::ROOT;
        for segment in folders {
            folder = self.find_or_create_folder(folder, segment)?.0;
        }
        self.relocate_mod(identity, folder, leaf)
    }

    fn relocate_mod(&mut self, identity: &str, folder: FolderId, name: &str) -> Result<bool> {
        let name = sanitize_name(name);
        if name.is_empty() {
            return Err(Error::InvalidName(name));
        }
        let order = self
            .leaves
            .get(identity)
            .cloned()
            .ok_or_else(|| Error::ModNotFound(identity.to_string()))?;
        if order.folder == folder && order.name == name {
            return Ok(false);
        }

        let key = name_key(&name);
        let own_slot = order.folder == folder && name_key(&order.name) == key;
        if !own_slot && self.get(folder)?.has_child(&key) {
            return Err(self.collision(folder, &name));
        }

        self.unlink_mod(identity)?;
        self.link_mod(identity, folder, name)?;
        if order.folder != folder {
            self.prune(order.folder);
        }
        Ok(true)
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let mut reachable_mods = 0;
        let mut reachable_folders = 0;
        let mut pending = vec![FolderId::ROOT];

        while let Some(id) = pending.pop() {
            reachable_folders += 1;
            let folder = self.get(id).expect("reachable folder is live");
            for (key, &sub) in &folder.sub_folders {
                assert!(!folder.mods.contains_key(key), "folder and mod share '{key}'");
                let child = self.get(sub).expect("sub-folder is live");
                assert_eq!(&name_key(&child.name), key);
                assert_eq!(child.parent, Some(id));
                pending.push(sub);
            }
            for (key, identity) in &folder.mods {
                let order = &self.leaves[identity];
                assert_eq!(order.folder, id);
                assert_eq!(&name_key(&order.name), key);
                reachable_mods += 1;
            }
        }

        assert_eq!(reachable_mods, self.leaves.len(), "every mod is reachable");
        assert_eq!(reachable_folders, self.folder_ids().len(), "no orphaned folders");
    }
}
