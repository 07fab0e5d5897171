//! Save/Load system
//!
//! This module provides slot-based save/restore of a scene's persistent state:
//! - JSON save files (human-readable, debuggable), one per slot (1-3)
//! - Per-feature adapters captured into flat component records
//! - Restore against a freshly loaded scene, tolerant of missing entities,
//!   missing components and individual adapter failures
//!
//! # Architecture
//!
//! - `types`: Save file schema and error types
//! - `saveable`: Adapter traits
//! - `store`: Slot files on disk
//! - `manager`: SaveManager, the save/load state machine
//!
//! # Example Usage
//!
//! ```ignore
//! let mut manager = SaveManager::new(SaveConfig::default(), gameplay_state)?;
//!
//! manager.save_to_slot(1, &scenes)?;
//!
//! match manager.load_from_slot(1, &mut scenes)? {
//!     LoadOutcome::Pending => { /* call manager.update() every frame */ }
//!     LoadOutcome::Restored(summary) => println!("{summary}"),
//!     LoadOutcome::EmptySlot => println!("Nothing saved yet"),
//! }
//! ```

pub mod manager;
pub mod saveable;
pub mod store;
pub mod types;


// Re-export commonly used types
pub use manager::{LoadOutcome, ManagerState, RestorePhase, SaveManager, SlotInfo};
pub use saveable::{SaveAdapter, Saveable};
pub use store::SlotStore;
pub use types::*;
