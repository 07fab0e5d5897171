//! Save adapters for the game's persistent features
//!
//! Each adapter binds to one live component through a weak handle. When the
//! component has been dropped the adapter captures nothing and ignores
//! restores, which is how a removed feature drops out of saves.

pub mod counter;
pub mod drawer;
pub mod settings;
pub mod toggle;
pub mod transform;

pub use counter::{CounterAdapter, CounterState};
pub use drawer::{DrawerAdapter, DrawerState};
pub use settings::{SettingsAdapter, SettingsState};
pub use toggle::{ToggleAdapter, ToggleState};
pub use transform::{TransformAdapter, TransformState};

use crate::save::SaveError;

/// Rejects records carrying NaN or infinite values
pub(crate) fn ensure_finite(type_tag: &str, field: &str, values: &[f32]) -> Result<(), SaveError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(SaveError::AdapterApply {
            type_tag: type_tag.to_string(),
            reason: format!("non-finite value in '{field}'"),
        })
    }
}
