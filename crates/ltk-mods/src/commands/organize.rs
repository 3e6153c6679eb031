use crate::errors::CliError;
use crate::utils::{config::AppConfig, open_manager};
use colored::Colorize;
use miette::Result;

pub struct MoveModArgs {
    pub identity: String,
    /// Full slash-separated tree path; the last segment is the leaf name.
    pub sort_path: String,
}

pub fn move_mod(cfg: &AppConfig, args: MoveModArgs) -> Result<()> {
    let mut manager = open_manager(cfg)?;
    if manager.descriptor(&args.identity).is_none() {
        return Err(CliError::mod_not_found(&args.identity).into());
    }

    let moved = manager
        .file_system_mut()
        .move_mod_to_path(&args.identity, &args.sort_path)
        .map_err(CliError::from)?;

    if moved {
        let path = manager
            .file_system()
            .tree()
            .full_path(&args.identity)
            .unwrap_or_default();
        println!("{}", "✓ Mod moved".bright_green().bold());
        println!();
        println!("  {} {}", "Path:".bright_white().bold(), path.bright_green());
    } else {
        println!("{}", "Mod is already at that path".bright_yellow());
    }
    Ok(())
}

pub struct RenameFolderArgs {
    pub path: String,
    pub name: String,
}

pub fn rename_folder(cfg: &AppConfig, args: RenameFolderArgs) -> Result<()> {
    let mut manager = open_manager(cfg)?;
    let folder = manager
        .file_system()
        .folder(&args.path)
        .map_err(|_| CliError::folder_not_found(&args.path))?;
    if folder.is_root() {
        return Err(CliError::folder_not_found(&args.path).into());
    }

    let renamed = manager
        .file_system_mut()
        .rename_folder(folder, &args.name)
        .map_err(CliError::from)?;

    if renamed {
        println!("{}", "✓ Folder renamed".bright_green().bold());
    } else {
        println!("{}", "Folder already has that name".bright_yellow());
    }
    Ok(())
}
