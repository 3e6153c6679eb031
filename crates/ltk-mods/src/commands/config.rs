use crate::errors::CliError;
use crate::utils::config::{self, AppConfig};
use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;
use miette::Result;

fn update_config(edit: impl FnOnce(&mut AppConfig)) -> Result<()> {
    let mut cfg = config::load_config();
    edit(&mut cfg);
    config::save_config(&cfg).map_err(|e| miette::miette!("Failed to save config: {}", e))
}

/// Print a config path entry with status indicator
fn print_path_config(name: &str, path: Option<&Utf8Path>, note: Option<&str>) {
    match path {
        Some(p) => {
            let status = if p.as_std_path().is_dir() {
                "✓".bright_green()
            } else {
                "✗".bright_red()
            };
            let note = note.map(|n| format!(" ({})", n).dimmed().to_string());
            println!(
                "  {} {} {}{}",
                format!("{}:", name).bright_white(),
                p,
                status,
                note.unwrap_or_default()
            );
        }
        None => {
            println!(
                "  {} {}",
                format!("{}:", name).bright_white(),
                "(not set)".bright_yellow()
            );
        }
    }
}

pub fn show_config() -> Result<()> {
    let cfg = config::load_config();
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    println!();
    println!("  {} {}", "config_file:".bright_white(), config_path);

    print_path_config("mod_directory", cfg.mod_directory.as_deref(), None);

    let data_dir = cfg.effective_data_directory();
    let note = cfg.data_directory.is_none().then_some("platform default");
    print_path_config("data_directory", data_dir.as_deref(), note);

    println!();
    Ok(())
}

pub fn set_mod_dir(path: String) -> Result<()> {
    let path = Utf8PathBuf::from(&path);
    if !path.as_std_path().is_dir() {
        return Err(CliError::InvalidModDirectory { path }.into());
    }

    update_config(|cfg| cfg.mod_directory = Some(path.clone()))?;

    println!("{}", "✓ Mod directory set successfully!".bright_green().bold());
    println!();
    println!(
        "  {} {}",
        "Path:".bright_white().bold(),
        path.as_str().bright_green()
    );

    Ok(())
}

pub fn set_data_dir(path: String) -> Result<()> {
    let path = Utf8PathBuf::from(&path);
    std::fs::create_dir_all(path.as_std_path()).map_err(CliError::from)?;

    update_config(|cfg| cfg.data_directory = Some(path.clone()))?;

    println!("{}", "✓ Data directory set successfully!".bright_green().bold());
    println!();
    println!(
        "  {} {}",
        "Path:".bright_white().bold(),
        path.as_str().bright_green()
    );

    Ok(())
}

pub fn reset_config() -> Result<()> {
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let default_cfg = AppConfig::default();
    config::save_config(&default_cfg)
        .map_err(|e| miette::miette!("Failed to reset config: {}", e))?;

    println!(
        "{}",
        "✓ Configuration reset to defaults".bright_green().bold()
    );
    println!();
    println!("  {} {}", "Config file:".bright_white().bold(), config_path);
    println!();
    println!(
        "  {}",
        "Run 'ltk-mods config set-mod-dir <path>' to point at your mods".bright_cyan()
    );

    Ok(())
}
