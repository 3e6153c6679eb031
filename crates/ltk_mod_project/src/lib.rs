//! Mod definition files.
//!
//! Every mod directory carries a `mod.config.json` (or `mod.config.toml`) that
//! describes the mod and declares its option groups. This crate only holds the
//! serde types and the parsing helpers; turning a definition into a resolvable
//! mod is the job of `ltk_mod_core`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// File name of the JSON mod definition.
pub const CONFIG_JSON: &str = "mod.config.json";
/// File name of the TOML mod definition.
pub const CONFIG_TOML: &str = "mod.config.toml";

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported mod definition file: {0}")]
    UnsupportedFormat(String),
}

/// Describes a mod definition file
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct ModProject {
    /// The name of the mod
    /// Must not contain spaces or special characters except for underscores and hyphens
    ///
    /// Example: `crimson-outfit`
    pub name: String,

    /// The display name of the mod. Also the default leaf name in the mod tree.
    ///
    /// Example: `Crimson Outfit`
    pub display_name: String,

    /// The version of the mod
    ///
    /// Example: `1.0.0`
    #[serde(default)]
    pub version: String,

    /// The description of the mod
    #[serde(default)]
    pub description: String,

    /// The authors of the mod
    #[serde(default)]
    pub authors: Vec<ModProjectAuthor>,

    /// The license of the mod
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<ModProjectLicense>,

    /// Where the mod was published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Free-form tags (e.g. "outfit", "ui")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Optional file groups of the mod
    /// Group names must be unique within the mod
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub option_groups: Vec<ModProjectGroup>,
}

/// How many options of a group can be active at once.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GroupSelection {
    /// Exactly one option is active, stored as its index.
    #[default]
    Single,
    /// Any subset of options is active, stored as a bitmask.
    Multi,
}

impl fmt::Display for GroupSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupSelection::Single => f.write_str("single"),
            GroupSelection::Multi => f.write_str("multi"),
        }
    }
}

/// A named group of mutually exclusive or independently togglable options
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct ModProjectGroup {
    pub name: String,

    #[serde(default)]
    pub selection: GroupSelection,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Options in declaration order. The order defines selection indices and bits.
    #[serde(default)]
    pub options: Vec<ModProjectOption>,
}

/// One option of a group
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct ModProjectOption {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Virtual asset path -> file inside the mod directory
    ///
    /// Example: `"tex/c.tex" = "options/blue/c.tex"`
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum ModProjectAuthor {
    Name(String),
    Role { name: String, role: String },
}

impl ModProjectAuthor {
    pub fn name(&self) -> &str {
        match self {
            ModProjectAuthor::Name(name) => name,
            ModProjectAuthor::Role { name, .. } => name,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum ModProjectLicense {
    Spdx(String),
    Custom { name: String, url: String },
}

impl ModProject {
    /// Parse a definition from JSON text.
    pub fn from_json_str(contents: &str) -> Result<Self, ProjectError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Parse a definition from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ProjectError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load a definition file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&contents),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::from_toml_str(&contents),
            _ => Err(ProjectError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Find the definition file inside a mod directory.
    ///
    /// JSON takes precedence when both files exist.
    pub fn find_in_dir(mod_dir: &Path) -> Option<std::path::PathBuf> {
        [CONFIG_JSON, CONFIG_TOML]
            .into_iter()
            .map(|name| mod_dir.join(name))
            .find(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_example_project() -> ModProject {
        ModProject {
            name: "crimson-outfit".to_string(),
            display_name: "Crimson Outfit".to_string(),
            version: "1.2.0".to_string(),
            description: "Recolors the default outfit".to_string(),
            authors: vec![
                ModProjectAuthor::Name("Mirelle".to_string()),
                ModProjectAuthor::Role {
                    name: "Tobin".to_string(),
                    role: "Textures".to_string(),
                },
            ],
            license: Some(ModProjectLicense::Spdx("MIT".to_string())),
            website: None,
            tags: vec!["outfit".to_string(), "recolor".to_string()],
            option_groups: vec![
                ModProjectGroup {
                    name: "Variant".to_string(),
                    selection: GroupSelection::Single,
                    description: None,
                    options: vec![
                        ModProjectOption {
                            name: "Red".to_string(),
                            description: None,
                            files: BTreeMap::new(),
                        },
                        ModProjectOption {
                            name: "Blue".to_string(),
                            description: Some("Blue trim".to_string()),
                            files: BTreeMap::from([(
                                "tex/c.tex".to_string(),
                                "options/blue/c.tex".to_string(),
                            )]),
                        },
                    ],
                },
                ModProjectGroup {
                    name: "Extras".to_string(),
                    selection: GroupSelection::Multi,
                    description: Some("Optional accessories".to_string()),
                    options: vec![
                        ModProjectOption {
                            name: "Hat".to_string(),
                            description: None,
                            files: BTreeMap::from([(
                                "mdl/hat.mdl".to_string(),
                                "options/hat.mdl".to_string(),
                            )]),
                        },
                        ModProjectOption {
                            name: "Scarf".to_string(),
                            description: None,
                            files: BTreeMap::from([(
                                "mdl/scarf.mdl".to_string(),
                                "options/scarf.mdl".to_string(),
                            )]),
                        },
                    ],
                },
            ],
        }
    }

    #[test]
    fn test_json_parsing() {
        let project =
            ModProject::from_json_str(include_str!("../test-data/mod.config.json")).unwrap();

        assert_eq!(project, create_example_project());
    }

    #[test]
    fn test_toml_parsing() {
        let project =
            ModProject::from_toml_str(include_str!("../test-data/mod.config.toml")).unwrap();

        assert_eq!(project, create_example_project());
    }

    #[test]
    fn test_minimal_definition() {
        let config = r#"
        {
            "name": "test-mod",
            "display_name": "Test Mod"
        }
        "#;

        let project = ModProject::from_json_str(config).unwrap();
        assert!(project.option_groups.is_empty());
        assert!(project.authors.is_empty());
        assert_eq!(project.version, "");
    }

    #[test]
    fn test_selection_defaults_to_single() {
        let config = r#"
        {
            "name": "test-mod",
            "display_name": "Test Mod",
            "option_groups": [{ "name": "Color", "options": [] }]
        }
        "#;

        let project = ModProject::from_json_str(config).unwrap();
        assert_eq!(project.option_groups[0].selection, GroupSelection::Single);
    }

    #[test]
    fn test_selection_serialization() {
        assert_eq!(
            serde_json::to_string(&GroupSelection::Multi).unwrap(),
            r#""multi""#
        );
        assert_eq!(GroupSelection::Single.to_string(), "single");
    }

    #[test]
    fn test_author_name() {
        let project = create_example_project();
        let names: Vec<&str> = project.authors.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["Mirelle", "Tobin"]);
    }

    #[test]
    fn test_load_unsupported_extension() {
        let dir = std::env::temp_dir().join("ltk_mod_project_unsupported.yaml");
        std::fs::write(&dir, "name: x").unwrap();
        let result = ModProject::load(&dir);
        assert!(matches!(result, Err(ProjectError::UnsupportedFormat(_))));
        let _ = std::fs::remove_file(&dir);
    }
}
