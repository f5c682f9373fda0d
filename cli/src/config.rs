//! Editor configuration.
//!
//! A small YAML file that sets the database location, the Edge profile used
//! for default discovery, and how the sampler prints rows. Every field is
//! optional; missing fields take their defaults.
//!
//! # Example YAML
//!
//! ```yaml
//! database: /home/me/.config/microsoft-edge/Default/Collections/collectionsSQLite
//! profile: Default
//! sample:
//!   limit: 1
//!   truncate: 40
//!   blob_fields: [thumbnail, source, entity_blob]
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use edge_collections_core::{DEFAULT_BLOB_FIELDS, DEFAULT_TRUNCATE_LIMIT};
use edge_collections_sqlite::DEFAULT_PROFILE;
use serde::{Deserialize, Serialize};
use tracing::debug;

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Settings for the `sample` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    /// Rows printed per table.
    pub limit: usize,
    /// Length after which blob-like fields are cut.
    pub truncate: usize,
    /// Fields shortened before printing.
    pub blob_fields: Vec<String>,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            limit: 1,
            truncate: DEFAULT_TRUNCATE_LIMIT,
            blob_fields: DEFAULT_BLOB_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Top-level editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Explicit database file; the profile's default location otherwise.
    pub database: Option<PathBuf>,
    /// Edge profile directory name.
    pub profile: String,
    pub sample: SampleConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            database: None,
            profile: DEFAULT_PROFILE.to_string(),
            sample: SampleConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Loads configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|err| format!("Failed to open config '{}': {err}", path.display()))?;
        serde_yaml::from_reader(BufReader::new(file))
            .map_err(|err| format!("Failed to parse config '{}': {err}", path.display()))
    }

    /// Loads `explicit` if given, else the per-user config file if it
    /// exists, else the defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, String> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "loading user config");
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }
}

/// `<config dir>/edge-collections/config.yaml` for the current user.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "edge-collections").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config: EditorConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.profile, "Default");
        assert_eq!(config.sample.limit, 1);
        assert_eq!(config.sample.truncate, 40);
        assert!(config.sample.blob_fields.iter().any(|f| f == "thumbnail"));
    }

    #[test]
    fn test_partial_sample_section() {
        let yaml = r#"
profile: "Profile 2"
sample:
  limit: 5
"#;
        let config: EditorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.profile, "Profile 2");
        assert_eq!(config.sample.limit, 5);
        assert_eq!(config.sample.truncate, 40);
        assert!(config.database.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "database: /tmp/collectionsSQLite\nsample:\n  blob_fields: [tag]\n")
            .unwrap();

        let config = EditorConfig::resolve(Some(&path)).unwrap();
        assert_eq!(config.database, Some(PathBuf::from("/tmp/collectionsSQLite")));
        assert_eq!(config.sample.blob_fields, vec!["tag"]);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EditorConfig::resolve(Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(err.contains("nope.yaml"));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "sample: [not, a, map]").unwrap();
        assert!(EditorConfig::load(&path).unwrap_err().starts_with("Failed to parse"));
    }
}
