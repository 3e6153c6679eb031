//! Virtual folder tree for organizing installed mods.
//!
//! Mods are shown to the user inside a hierarchy of folders that exists only
//! for organization: it never influences which files get resolved. This crate
//! provides:
//!
//! - [`ModTree`]: an arena of folders whose leaves are mod identities, with
//!   case-insensitive sibling names, automatic folder merging and pruning of
//!   folders left empty
//! - [`SortOrderTable`]: the persisted overrides recording where the user
//!   placed each mod
//! - [`ModFileSystem`]: the tree, its overrides and change listeners bundled so
//!   that each operation is saved and announced exactly once
//!
//! # Example
//!
//! ```
//! use ltk_mod_tree::{ModFileSystem, TreeChange};
//!
//! let mut fs = ModFileSystem::in_memory();
//! fs.subscribe(|change: &TreeChange| println!("{change:?}"));
//! fs.load([("crimson-outfit", "Crimson Outfit")]).unwrap();
//!
//! fs.move_mod_to_path("crimson-outfit", "Outfits/Red/Crimson").unwrap();
//! assert_eq!(
//!     fs.tree().full_path("crimson-outfit").as_deref(),
//!     Some("Outfits/Red/Crimson")
//! );
//! ```

pub mod error;
pub mod file_system;
pub mod sort_order;
pub mod tree;

pub use error::{Error, Result};
pub use file_system::{ChangeListener, ModFileSystem, TreeChange};
pub use sort_order::{JsonSortOrderStore, NullSortOrderStore, SortOrderStore, SortOrderTable};
pub use tree::{sanitize_name, FolderId, ModTree, SortOrder};
