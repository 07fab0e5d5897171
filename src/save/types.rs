//! Save data types
//!
//! This module defines the on-disk save file schema and the error taxonomy
//! shared by the store, the adapters and the manager. Everything here is
//! plain Serde data; field names match the JSON document written per slot.

use crate::entity::EntityId;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current save file version
pub const CURRENT_SAVE_VERSION: &str = "1.1";

/// The root save file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFile {
    pub version: String,
    pub scene_name: String,
    pub saved_unix_time: i64,
    #[serde(default)]
    pub entries: Vec<EntityRecord>,
}

impl SaveFile {
    /// Creates an empty save file for `scene_name`, stamped with the current UTC time
    pub fn new(scene_name: impl Into<String>) -> Self {
        SaveFile {
            version: CURRENT_SAVE_VERSION.to_string(),
            scene_name: scene_name.into(),
            saved_unix_time: Utc::now().timestamp(),
            entries: Vec::new(),
        }
    }

    /// Parses a save file from its JSON text
    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes to pretty-printed JSON (human-readable, debuggable)
    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The save time as a UTC timestamp, if it is representable
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.saved_unix_time, 0).single()
    }

    pub fn component_count(&self) -> usize {
        self.entries.iter().map(|e| e.components.len()).sum()
    }
}

/// One persisted entity: its identifier plus every captured component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    /// Diagnostic label only, never used for matching
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
}

/// One adapter's captured state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Stable type tag of the adapter that produced this record
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Adapter-specific record, itself serialized as JSON
    pub json: String,
}

/// Diagnostic counts from one restore pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub entities_restored: usize,
    pub components_restored: usize,
    pub missing_entities: usize,
    pub missing_components: usize,
    pub failed_components: usize,
    pub duplicate_ids: usize,
}

impl RestoreSummary {
    /// Counts a record that could not be applied
    pub fn record_failure(&mut self, error: &SaveError) {
        match error {
            SaveError::MissingEntity(_) => self.missing_entities += 1,
            SaveError::MissingComponent { .. } => self.missing_components += 1,
            _ => self.failed_components += 1,
        }
    }
}

impl std::fmt::Display for RestoreSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "entitiesRestored={}, componentsRestored={}, missingEntities={}, missingComponents={}, failedComponents={}, duplicateIds={}",
            self.entities_restored,
            self.components_restored,
            self.missing_entities,
            self.missing_components,
            self.failed_components,
            self.duplicate_ids
        )
    }
}

/// Error types for save/load operations
#[derive(Debug, Error)]
pub enum SaveError {
    /// No save file in this slot. A normal condition, not a failure.
    #[error("no save in slot {0}")]
    EmptySlot(u8),

    #[error("save in slot {slot} is corrupt: {reason}")]
    CorruptSave { slot: u8, reason: String },

    #[error("unsupported save version: {0}")]
    InvalidVersion(String),

    #[error("scene '{0}' is not loadable")]
    SceneUnavailable(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("entity not found: {0}")]
    MissingEntity(EntityId),

    #[error("entity {entity} has no adapter '{type_tag}'")]
    MissingComponent { entity: EntityId, type_tag: String },

    #[error("adapter '{type_tag}' failed to restore: {reason}")]
    AdapterApply { type_tag: String, reason: String },

    #[error("a load is already in progress")]
    LoadInProgress,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SaveError {
    /// File or scene level failures abort the whole operation
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SaveError::EmptySlot(_)
                | SaveError::MissingEntity(_)
                | SaveError::MissingComponent { .. }
                | SaveError::AdapterApply { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_field_names() {
        let mut file = SaveFile::new("Level1");
        file.saved_unix_time = 1_700_000_000;
        file.entries.push(EntityRecord {
            id: EntityId::from("abc"),
            name: "Door".to_string(),
            components: vec![ComponentRecord {
                type_tag: "puzzle_save::adapters::ToggleAdapter".to_string(),
                json: r#"{"is_on":true}"#.to_string(),
            }],
        });

        let value: serde_json::Value = serde_json::from_str(&file.to_json().unwrap()).unwrap();
        assert_eq!(value["version"], "1.1");
        assert_eq!(value["sceneName"], "Level1");
        assert_eq!(value["savedUnixTime"], 1_700_000_000i64);
        assert_eq!(value["entries"][0]["id"], "abc");
        assert_eq!(value["entries"][0]["components"][0]["type"], "puzzle_save::adapters::ToggleAdapter");
        assert_eq!(value["entries"][0]["components"][0]["json"], r#"{"is_on":true}"#);
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        let result = SaveFile::from_json(r#"{"version": 3, "entries": "nope"}"#);
        assert!(matches!(result, Err(SaveError::Serialization(_))));
    }

    #[test]
    fn test_saved_at() {
        let mut file = SaveFile::new("Level1");
        file.saved_unix_time = 0;
        assert_eq!(file.saved_at().unwrap().timestamp(), 0);
    }

    #[test]
    fn test_summary_counts_failures_by_kind() {
        let mut summary = RestoreSummary::default();
        summary.record_failure(&SaveError::MissingEntity(EntityId::from("gone")));
        summary.record_failure(&SaveError::MissingComponent {
            entity: EntityId::from("door"),
            type_tag: "Lock".into(),
        });
        summary.record_failure(&SaveError::AdapterApply {
            type_tag: "Lock".into(),
            reason: "bad payload".into(),
        });
        summary.duplicate_ids = 2;

        assert_eq!(summary.missing_entities, 1);
        assert_eq!(summary.missing_components, 1);
        assert_eq!(summary.failed_components, 1);
        assert!(summary.to_string().ends_with("duplicateIds=2"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(!SaveError::EmptySlot(1).is_fatal());
        assert!(SaveError::SceneUnavailable("Nowhere".into()).is_fatal());
        assert!(!SaveError::MissingEntity(EntityId::from("x")).is_fatal());
    }
}
