//! One-second advancement loop

use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::engine::WeakEngine;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Advance the engine once per second until the run identified by
/// `generation` ends or the engine is dropped
pub async fn ticker_task(engine: WeakEngine, generation: u64) {
    debug!("Ticker {} started", generation);

    let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let Some(engine) = engine.upgrade() else {
            break;
        };
        if !engine.advance(generation) {
            break;
        }
    }

    debug!("Ticker {} finished", generation);
}
