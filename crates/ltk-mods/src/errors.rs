use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Mod directory is not configured")]
    #[diagnostic(
        code(config::mod_dir_not_set),
        help("Run 'ltk-mods config set-mod-dir <path>' or pass --mod-dir")
    )]
    ModDirectoryNotSet,

    #[error("Could not determine a data directory")]
    #[diagnostic(
        code(config::data_dir_unknown),
        help("Run 'ltk-mods config set-data-dir <path>' or pass --data-dir")
    )]
    DataDirectoryUnknown,

    #[error("Mod directory does not exist: {path}")]
    #[diagnostic(
        code(config::invalid_mod_dir),
        help("The mod directory must contain one sub-directory per mod")
    )]
    InvalidModDirectory { path: Utf8PathBuf },

    #[error("Mod not found: {identity}")]
    #[diagnostic(
        code(mods::not_found),
        help("Mod identities are directory names; run 'ltk-mods tree' to list them")
    )]
    ModNotFound { identity: String },

    #[error("Folder not found: {path}")]
    #[diagnostic(
        code(tree::folder_not_found),
        help("Folder paths are slash-separated and case-insensitive, e.g. Skins/Blue")
    )]
    FolderNotFound { path: String },

    #[error("Collection operation failed")]
    #[diagnostic(code(collections::operation_failed))]
    Collections {
        #[from]
        source: ltk_collections::Error,
    },

    #[error("Tree operation failed")]
    #[diagnostic(code(tree::operation_failed))]
    Tree {
        #[from]
        source: ltk_mod_tree::Error,
    },

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn mod_not_found(identity: impl Into<String>) -> Self {
        Self::ModNotFound {
            identity: identity.into(),
        }
    }

    pub fn folder_not_found(path: impl Into<String>) -> Self {
        Self::FolderNotFound { path: path.into() }
    }
}
