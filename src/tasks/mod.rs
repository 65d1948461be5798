//! Background tasks module
//! 
//! Every long-lived task the engine schedules: the tick loop, the delayed
//! post-boundary reset and the settings subscription.

pub mod post_boundary_reset;
pub mod settings_sync;
pub mod slot;
pub mod ticker;

// Re-export main functions
pub use post_boundary_reset::{post_boundary_reset_task, POST_BOUNDARY_RESET_DELAY};
pub use settings_sync::settings_sync_task;
pub use slot::TaskSlot;
pub use ticker::{ticker_task, TICK_PERIOD};
