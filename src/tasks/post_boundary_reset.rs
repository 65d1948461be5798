//! Delayed reset after a run reaches its boundary

use std::time::Duration;
use tokio::time::sleep;

use crate::engine::{Boundary, WeakEngine};

/// Pause between reaching a boundary and restoring the idle value
pub const POST_BOUNDARY_RESET_DELAY: Duration = Duration::from_secs(1);

pub async fn post_boundary_reset_task(engine: WeakEngine, generation: u64, boundary: Boundary) {
    sleep(POST_BOUNDARY_RESET_DELAY).await;
    if let Some(engine) = engine.upgrade() {
        engine.finish_post_boundary_reset(generation, boundary);
    }
}
