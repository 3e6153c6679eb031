//! Lock-free views of the resolve chain.
//!
//! A [`ResolveSnapshot`] holds shared references to the caches of every
//! collection the chain can reach. Caches are never mutated once built, so a
//! snapshot stays consistent while the control thread rebuilds and publishes
//! newer ones.

use crate::effective::{EffectiveCache, ResolvedEntry};
use ltk_mod_core::{GamePath, Redirect};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Which link of the chain answered a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveSource {
    Character,
    Default,
    Forced,
}

/// Immutable resolve chain: per-identity caches, then default, then forced.
#[derive(Debug, Clone, Default)]
pub struct ResolveSnapshot {
    pub(crate) characters: HashMap<String, Arc<EffectiveCache>>,
    pub(crate) default_: Option<Arc<EffectiveCache>>,
    pub(crate) forced: Option<Arc<EffectiveCache>>,
}

impl ResolveSnapshot {
    /// Resolve `path` for `identity`.
    ///
    /// `None` means no redirect: serve the original asset. The first link with
    /// an entry answers, even when that entry is a removal.
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
        let character = identity.and_then(|id| self.characters.get(id));
        [
            (ResolveSource::Character, character),
            (ResolveSource::Default, self.default_.as_ref()),
            (ResolveSource::Forced, self.forced.as_ref()),
        ]
        .into_iter()
        .find_map(|(source, cache)| cache?.get(path).map(|entry| (source, entry)))
    }
}

/// The current snapshot, shared between the control thread and readers.
///
/// Readers take the lock only long enough to clone the inner [`Arc`];
/// resolution itself runs on the cloned snapshot.
#[derive(Debug, Clone, Default)]
pub struct SharedResolver {
    current: Arc<RwLock<Arc<ResolveSnapshot>>>,
}

impl SharedResolver {
    pub fn new(snapshot: ResolveSnapshot) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// Replace the current snapshot.
    pub fn publish(&self, snapshot: ResolveSnapshot) {
        *self.current.write() = Arc::new(snapshot);
    }

    pub fn load(&self) -> Arc<ResolveSnapshot> {
        self.current.read().clone()
    }

    pub fn resolve(&self, path: &GamePath, identity: Option<&str>) -> Option<Redirect> {
        self.load().resolve(path, identity)
    }
}
