//! State management module
//! 
//! Snapshots, settings and server-side bookkeeping shared between the
//! engine and the HTTP layer.

pub mod app_state;
pub mod confirmation;
pub mod settings_state;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use confirmation::Confirmation;
pub use settings_state::{Settings, SettingsUpdate, StartDuration};
pub use timer_state::{format_clock, TimerState};
