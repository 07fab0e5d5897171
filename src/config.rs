//! Save system configuration
//!
//! Loaded from an optional JSON file; every field has a default so an empty
//! `{}` is a valid config.

use crate::save::SaveError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How strictly the `version` field of a save file is checked on load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionPolicy {
    /// Accept any version with the same major number as the current one
    #[default]
    SameMajor,
    /// Accept only the exact current version
    Exact,
    /// Treat the version as informational
    Any,
}

impl VersionPolicy {
    pub fn accepts(&self, version: &str, current: &str) -> bool {
        match self {
            VersionPolicy::Any => true,
            VersionPolicy::Exact => version == current,
            VersionPolicy::SameMajor => major(version).is_some() && major(version) == major(current),
        }
    }
}

fn major(version: &str) -> Option<&str> {
    let major = version.trim().split('.').next()?;
    (!major.is_empty() && major.chars().all(|c| c.is_ascii_digit())).then_some(major)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    /// Where slot files live. `None` picks the platform data directory.
    pub save_directory: Option<PathBuf>,
    pub app_name: String,
    pub file_prefix: String,
    pub file_extension: String,
    pub slot_count: u8,
    pub version_policy: VersionPolicy,
    /// Entity name to wait for after a load before re-enabling input
    pub ready_entity: Option<String>,
    pub ready_timeout_ms: u64,
    pub atomic_writes: bool,
}

impl Default for SaveConfig {
    fn default() -> Self {
        SaveConfig {
            save_directory: None,
            app_name: "puzzle_game".to_string(),
            file_prefix: "slot_".to_string(),
            file_extension: "json".to_string(),
            slot_count: 3,
            version_policy: VersionPolicy::SameMajor,
            ready_entity: Some("Player".to_string()),
            ready_timeout_ms: 2000,
            atomic_writes: true,
        }
    }
}

impl SaveConfig {
    /// Config writing into `dir`, everything else default
    pub fn in_directory(dir: impl AsRef<Path>) -> Self {
        SaveConfig {
            save_directory: Some(dir.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SaveError> {
        let content = fs::read_to_string(path)?;
        let config: SaveConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SaveError> {
        if self.slot_count == 0 {
            return Err(SaveError::Config("slot_count must be at least 1".to_string()));
        }
        if self.file_prefix.is_empty() {
            return Err(SaveError::Config("file_prefix must not be empty".to_string()));
        }
        if self.file_prefix.contains(['/', '\\']) || self.file_extension.contains(['/', '\\']) {
            return Err(SaveError::Config(
                "file_prefix and file_extension must not contain path separators".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved save directory: configured path, else `<data dir>/<app>/saves`
    pub fn resolve_save_directory(&self) -> PathBuf {
        if let Some(dir) = &self.save_directory {
            return dir.clone();
        }
        match dirs::data_dir() {
            Some(data) => data.join(&self.app_name).join("saves"),
            None => PathBuf::from("saves"),
        }
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    /// Clamps a requested slot into `1..=slot_count`
    pub fn clamp_slot(&self, slot: u8) -> u8 {
        slot.clamp(1, self.slot_count.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config: SaveConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.slot_count, 3);
        assert_eq!(config.file_prefix, "slot_");
        assert_eq!(config.version_policy, VersionPolicy::SameMajor);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save_config.json");
        fs::write(&path, r#"{"slot_count": 5, "version_policy": "exact"}"#).unwrap();

        let config = SaveConfig::load_from_file(&path).unwrap();

        assert_eq!(config.slot_count, 5);
        assert_eq!(config.version_policy, VersionPolicy::Exact);
        assert_eq!(config.clamp_slot(9), 5);
    }

    #[test]
    fn test_validate_rejects_zero_slots() {
        let config = SaveConfig {
            slot_count: 0,
            ..SaveConfig::default()
        };
        assert!(matches!(config.validate(), Err(SaveError::Config(_))));
    }

    #[test]
    fn test_clamp_slot() {
        let config = SaveConfig::default();
        assert_eq!(config.clamp_slot(0), 1);
        assert_eq!(config.clamp_slot(2), 2);
        assert_eq!(config.clamp_slot(7), 3);
    }

    #[test]
    fn test_version_policy() {
        assert!(VersionPolicy::SameMajor.accepts("1.0", "1.1"));
        assert!(!VersionPolicy::SameMajor.accepts("2.0", "1.1"));
        assert!(!VersionPolicy::SameMajor.accepts("", "1.1"));
        assert!(!VersionPolicy::Exact.accepts("1.0", "1.1"));
        assert!(VersionPolicy::Any.accepts("banana", "1.1"));
    }
}
