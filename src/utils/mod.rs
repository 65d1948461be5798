//! Utility functions module
//! 
//! Process signals and environment probing used by the binary.

pub mod locale;
pub mod signals;

// Re-export main functions
pub use locale::device_locale;
pub use signals::shutdown_signal;
