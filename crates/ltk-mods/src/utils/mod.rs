use crate::errors::CliError;
use crate::utils::config::AppConfig;
use ltk_collections::ModManager;
use miette::Result;
use regex::Regex;

pub mod config;

#[macro_export]
macro_rules! println_pad {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        for __line in __s.lines() {
            println!("    {}", __line);
        }
    }};
}

/// Opens the configured mod directory and runs discovery.
///
/// Mods that fail to load are reported as warnings; they do not stop the
/// command.
pub fn open_manager(cfg: &AppConfig) -> Result<ModManager> {
    let mod_dir = cfg.mod_directory.clone().ok_or(CliError::ModDirectoryNotSet)?;
    let data_dir = cfg
        .effective_data_directory()
        .ok_or(CliError::DataDirectoryUnknown)?;

    let mut manager = ModManager::open(mod_dir, data_dir).map_err(CliError::from)?;
    let report = manager.discover_mods().map_err(CliError::from)?;
    for (identity, error) in &report.failed {
        tracing::warn!("Skipped mod {}: {}", identity, error);
    }
    for (identity, error) in &report.rejected {
        tracing::warn!("Mod {} is not in the tree: {}", identity, error);
    }
    Ok(manager)
}

/// Prints the provided lines inside an ASCII box
pub fn print_ansi_boxed_lines(lines: &[String]) {
    let ansi = Regex::new("\x1b\\[[0-9;]*m").unwrap();
    let visible_len = |s: &str| ansi.replace_all(s, "").chars().count();

    let width = lines
        .iter()
        .map(|s| visible_len(s.as_str()))
        .max()
        .unwrap_or(0);

    let border = "-".repeat(width + 4);
    println_pad!("{}", border);
    for line in lines {
        let pad = width - visible_len(line.as_str());
        println_pad!("| {}{} |", line, " ".repeat(pad));
    }
    println_pad!("{}", border);
}
