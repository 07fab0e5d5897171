// Live gameplay components
//
// Minimal stand-ins for the engine objects the save adapters read and write:
// - transform.rs: Transform pose, Rigidbody, CharacterController
// - toggle.rs: on/off switch with change listeners
// - puzzle.rs: puzzle button counter and drawer
// - settings.rs: settings menu with an audio mixer

pub mod puzzle;
pub mod settings;
pub mod toggle;
pub mod transform;

pub use puzzle::{ButtonStats, DrawerPullout};
pub use settings::{AudioMixer, MemoryMixer, SettingsMenu};
pub use toggle::Toggle;
pub use transform::{CharacterController, Rigidbody, Transform};
