//! Priority-layered mod collections for LeagueToolkit.
//!
//! This crate answers one question: when the game asks for a virtual asset
//! path, which file on disk should it get instead, if any? It provides:
//!
//! - **Collections**: named sets of per-mod settings (enabled, priority, option
//!   selections), each with a cached effective mapping
//! - **Priority collapse**: higher priority wins, ties keep discovery order,
//!   and an option group that removes a path hides it from lower mods
//! - **Conflict reporting**: every path several enabled mods answer
//! - **Role chain**: per-character collection, then default, then forced
//! - **Snapshots**: immutable views of the chain for reader threads
//! - **Persistence**: one JSON file per collection plus role bindings
//!
//! # Example
//!
//! ```no_run
//! use ltk_collections::ModManager;
//! use ltk_mod_core::GamePath;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manager = ModManager::open("C:/LeagueMods", "C:/LeagueMods/.data")?;
//! let report = manager.discover_mods()?;
//! println!("Registered {} mod(s)", report.loaded.len());
//!
//! manager.set_enabled(None, "crimson-outfit", true)?;
//! manager.set_selection(None, "crimson-outfit", "Variant", 1)?;
//!
//! // Hand this to the thread serving file requests
//! let resolver = manager.resolver();
//! match resolver.resolve(&GamePath::new("assets/characters/hero/skin0.tex"), Some("Hero")) {
//!     Some(redirect) => println!("Redirected: {:?}", redirect),
//!     None => println!("Serving the original file"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod collection;
pub mod collection_set;
pub mod effective;
pub mod error;
pub mod manager;
pub mod snapshot;
pub mod source;
pub mod state;

// Re-export main types
pub use collection::Collection;
pub use collection_set::{CollectionSet, DEFAULT_COLLECTION};
pub use effective::{compute_effective, Conflict, EffectiveCache, ModContribution, ModRegistry, ResolvedEntry};
pub use error::{Error, Result};
pub use manager::{DiscoveryReport, ModManager};
pub use snapshot::{ResolveSnapshot, ResolveSource, SharedResolver};
pub use source::{FsModSource, ModSource};
pub use state::{CollectionFile, CollectionStore, RoleBindings};
