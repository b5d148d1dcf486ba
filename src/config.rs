//! Configuration management for mfd
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (mfd.toml)
//! - Environment variables (MFD__*)
//!
//! ## Example config file (mfd.toml):
//! ```toml
//! [project]
//! manifest = "model/newsportal.mfd"
//! create_missing = false
//!
//! [documents]
//! indent = 4
//!
//! [merge]
//! overwrite_code_type = false
//! infer_array_relations = true
//!
//! [translation]
//! languages = ["en", "ru"]
//!
//! [validation]
//! reserved_names = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::document::{LoadOptions, WriteOptions};
use crate::graph::merge::MergePolicy;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MfdConfig {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub documents: DocumentConfig,

    #[serde(default)]
    pub merge: MergeConfig,

    #[serde(default)]
    pub translation: TranslationConfig,

    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Project location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Path to the manifest document
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    /// Start an empty project when the manifest does not exist
    #[serde(default)]
    pub create_missing: bool,
}

/// Document writer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Spaces per nesting level
    #[serde(default = "default_indent")]
    pub indent: usize,
}

/// Merge behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Replace hand-edited code types with the scanned ones
    #[serde(default)]
    pub overwrite_code_type: bool,

    /// Turn `...IDs` array columns into relations after merging
    #[serde(default = "default_true")]
    pub infer_array_relations: bool,
}

/// Translation documents
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TranslationConfig {
    /// Languages to sync; empty means the project's own list
    #[serde(default)]
    pub languages: Vec<String>,
}

/// Validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Reject names that collide with keywords of generated code
    #[serde(default = "default_true")]
    pub reserved_names: bool,
}

// Default value functions
fn default_manifest() -> PathBuf {
    PathBuf::from("project.mfd")
}

fn default_indent() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            create_missing: false,
        }
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            overwrite_code_type: false,
            infer_array_relations: true,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { reserved_names: true }
    }
}

impl MfdConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, with an explicit file taking precedence over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["mfd.toml", ".mfd.toml", "config/mfd.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "mfd", "mfd") {
            let xdg_config = dirs.config_dir().join("mfd.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // MFD__MERGE__OVERWRITE_CODE_TYPE=true
        builder = builder.add_source(
            Environment::with_prefix("MFD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("translation.languages"),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    pub fn merge_policy(&self) -> MergePolicy {
        MergePolicy {
            overwrite_code_type: self.merge.overwrite_code_type,
            infer_array_relations: self.merge.infer_array_relations,
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            create_missing: self.project.create_missing,
        }
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            indent: self.documents.indent,
        }
    }
}
