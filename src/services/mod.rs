//! External collaborator module
//! 
//! Settings persistence and chime playback, the two services the timer
//! engine talks to without waiting on them.

pub mod chime;
pub mod player;
pub mod settings_store;
pub mod synth;

// Re-export main types
pub use chime::{ChimePlayer, ChimeRenderer, CHIME_BASE_NAME};
pub use player::PlayerCommand;
pub use settings_store::{FileSettingsStore, MemorySettingsStore, SettingsStore, StoreError};
