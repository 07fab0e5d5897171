//! Slot-based save/restore for a first-person puzzle game.
//!
//! Persistent objects carry a stable [`EntityId`] and a list of adapters, one
//! per save-relevant feature (pose, toggles, settings, puzzle state). The
//! [`SaveManager`] captures those adapters into a versioned JSON file per slot
//! and later restores them into a freshly loaded scene.

pub mod adapters;
pub mod components;
pub mod config;
pub mod entity;
pub mod math;
pub mod pause;
pub mod save;
pub mod scene;

pub use config::{SaveConfig, VersionPolicy};
pub use entity::{EntityBuilder, EntityId, IdRegistry, SaveableEntity};
pub use pause::{GameplayState, PauseController};
pub use save::{LoadOutcome, RestoreSummary, SaveError, SaveManager};
pub use scene::{SceneHost, StagedScenes};
