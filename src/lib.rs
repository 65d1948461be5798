//! Chime Timer - A count-down/count-up timer engine with a chime
//!
//! This library provides the timer engine, its settings reconciliation,
//! chime playback, the supported language table and an HTTP control API.

pub mod config;
pub mod state;
pub mod engine;
pub mod api;
pub mod languages;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use engine::TimerEngine;
pub use state::{AppState, TimerState};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
