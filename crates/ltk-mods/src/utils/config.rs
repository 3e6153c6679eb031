//! Application configuration management utilities.

use camino::Utf8PathBuf;
use directories_next::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::Path;

/// Application-wide configuration stored in config.toml.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    /// Directory holding one sub-directory per mod.
    pub mod_directory: Option<Utf8PathBuf>,
    /// Where collections, role bindings and the sort order are stored.
    /// Falls back to the platform data directory.
    pub data_directory: Option<Utf8PathBuf>,
}

impl AppConfig {
    pub fn effective_data_directory(&self) -> Option<Utf8PathBuf> {
        self.data_directory.clone().or_else(default_data_dir)
    }
}

/// Returns the directory where the current executable resides.
pub fn install_dir() -> Option<Utf8PathBuf> {
    let exe = env::current_exe().ok()?;
    let parent = exe.parent()?;
    Utf8PathBuf::from_path_buf(parent.to_path_buf()).ok()
}

/// Returns a config file path located next to the executable.
pub fn config_path(file_name: &str) -> Option<Utf8PathBuf> {
    install_dir().map(|dir| dir.join(file_name))
}

/// Returns the default configuration file path (config.toml).
pub fn default_config_path() -> Option<Utf8PathBuf> {
    config_path("config.toml")
}

/// Returns the platform data directory for ltk-mods.
pub fn default_data_dir() -> Option<Utf8PathBuf> {
    let dirs = ProjectDirs::from("", "LeagueToolkit", "ltk-mods")?;
    Utf8PathBuf::from_path_buf(dirs.data_dir().to_path_buf()).ok()
}

/// Parses configuration text, falling back to defaults on malformed input.
pub fn parse_config(content: &str) -> AppConfig {
    toml::from_str(content).unwrap_or_default()
}

/// Loads the application configuration from config.toml.
/// Returns default configuration if file doesn't exist or cannot be parsed.
pub fn load_config() -> AppConfig {
    if let Some(path) = default_config_path() {
        if Path::new(path.as_str()).exists() {
            if let Ok(content) = fs::read_to_string(path.as_str()) {
                return parse_config(&content);
            }
        }
    }
    AppConfig::default()
}

/// Saves the application configuration to config.toml.
pub fn save_config(cfg: &AppConfig) -> io::Result<()> {
    if let Some(path) = default_config_path() {
        let content = toml::to_string_pretty(cfg).map_err(io::Error::other)?;
        fs::write(path.as_str(), content)
    } else {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            "Could not determine config path",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let cfg = parse_config(
            r#"
            mod_directory = "C:/LeagueMods"
            data_directory = "C:/LeagueMods/.data"
            "#,
        );
        assert_eq!(cfg.mod_directory, Some(Utf8PathBuf::from("C:/LeagueMods")));
        assert_eq!(
            cfg.effective_data_directory(),
            Some(Utf8PathBuf::from("C:/LeagueMods/.data"))
        );
    }

    #[test]
    fn parse_malformed_config_falls_back() {
        assert_eq!(parse_config("mod_directory = ["), AppConfig::default());
        assert_eq!(parse_config(""), AppConfig::default());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let cfg = AppConfig {
            mod_directory: Some("/mods".into()),
            data_directory: None,
        };
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert_eq!(parse_config(&text), cfg);
    }
}
