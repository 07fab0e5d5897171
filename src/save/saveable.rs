//! Saveable trait for components that can be captured and restored
//!
//! Each save-relevant feature gets one adapter implementing [`SaveAdapter`]:
//! a typed, flat `State` record plus capture/restore. The blanket impl turns
//! every adapter into an object-safe [`Saveable`], which is what entities hold
//! and what the manager drives.
//!
//! Dispatch is by type tag: a [`ComponentRecord`] carries the tag of the
//! adapter that produced it, and on load the manager hands the record to the
//! attached adapter with the same tag. That adapter's own `State` type decides
//! how the payload is decoded, so no runtime type lookup is needed.

use super::types::{ComponentRecord, SaveError};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A per-feature capture/restore implementation
///
/// # Example
///
/// ```ignore
/// impl SaveAdapter for CounterAdapter {
///     type State = CounterState;
///     const TYPE_TAG: &'static str = "puzzle_save::adapters::CounterAdapter";
///
///     fn capture_state(&self) -> Option<CounterState> {
///         let stats = self.stats.upgrade()?;
///         Some(CounterState { button_value: stats.borrow().button_value })
///     }
///
///     fn restore_state(&mut self, state: CounterState) -> Result<(), SaveError> {
///         // write back through the live component
///     }
/// }
/// ```
pub trait SaveAdapter {
    /// Flat record describing the feature's persisted state
    type State: Serialize + DeserializeOwned;

    /// Tag written to the save file; must stay stable across builds
    const TYPE_TAG: &'static str;

    /// Reads the live state. `None` means the feature is not present right now
    /// and the component is skipped.
    fn capture_state(&self) -> Option<Self::State>;

    /// Applies saved state to the live feature. Must be safe to call repeatedly.
    fn restore_state(&mut self, state: Self::State) -> Result<(), SaveError>;

    /// Called once per frame; adapters that defer their restore apply it here
    fn tick(&mut self) {}
}

/// Object-safe view of an adapter, as attached to an entity
pub trait Saveable {
    fn type_tag(&self) -> &'static str;

    /// Captures the adapter's state into a component record
    fn capture(&self) -> Result<Option<ComponentRecord>, SaveError>;

    /// Decodes `record` into the adapter's state and restores it
    fn restore(&mut self, record: &ComponentRecord) -> Result<(), SaveError>;

    fn tick(&mut self);
}

impl<T: SaveAdapter> Saveable for T {
    fn type_tag(&self) -> &'static str {
        T::TYPE_TAG
    }

    fn capture(&self) -> Result<Option<ComponentRecord>, SaveError> {
        let Some(state) = self.capture_state() else {
            return Ok(None);
        };

        Ok(Some(ComponentRecord {
            type_tag: T::TYPE_TAG.to_string(),
            json: serde_json::to_string(&state)?,
        }))
    }

    fn restore(&mut self, record: &ComponentRecord) -> Result<(), SaveError> {
        if record.type_tag != T::TYPE_TAG {
            return Err(SaveError::AdapterApply {
                type_tag: T::TYPE_TAG.to_string(),
                reason: format!("record was written by '{}'", record.type_tag),
            });
        }

        let state: T::State =
            serde_json::from_str(&record.json).map_err(|e| SaveError::AdapterApply {
                type_tag: T::TYPE_TAG.to_string(),
                reason: e.to_string(),
            })?;

        self.restore_state(state)
    }

    fn tick(&mut self) {
        SaveAdapter::tick(self)
    }
}
