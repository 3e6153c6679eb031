//! Core mod model shared by the LeagueToolkit mod crates.
//!
//! This crate defines what a mod *is* for the resolver and how its option
//! groups pick files:
//!
//! - [`GamePath`] / [`RealPath`]: virtual asset paths and on-disk files
//! - [`OptionGroup`]: a named axis of variation (single or multi selection)
//! - [`ModDescriptor`]: one mod's identity, metadata, groups and files
//! - [`ModSettings`]: enabled flag, priority and group selections
//! - [`resolve_path`], [`all_files_for_path`], [`files_for_config`],
//!   [`convert_named_settings`], [`cleanup_collection`]: pure helpers that
//!   combine the above
//!
//! Nothing here performs I/O.

mod descriptor;
mod error;
mod functions;
mod group;
mod path;
mod settings;

pub use descriptor::{ModDescriptor, ModMeta};
pub use error::{Error, Result};
pub use functions::{
    all_files_for_path, cleanup_collection, convert_named_settings, files_for_config,
    resolve_path, Redirect,
};
pub use group::{GroupOption, OptionGroup, SelectionType, MAX_MULTI_OPTIONS};
pub use path::{GamePath, RealPath};
pub use settings::{ModSettings, NamedModSettings};
