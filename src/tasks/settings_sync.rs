//! Settings store subscription

use tokio::sync::watch;
use tracing::{debug, info};

use crate::{engine::WeakEngine, state::Settings};

/// Forward each later settings snapshot to the engine as per-key updates.
///
/// `delivered` is the snapshot the engine was initialized from. Keys whose
/// value did not change are skipped, except the start duration, which
/// accompanies every snapshot.
pub async fn settings_sync_task(
    engine: WeakEngine,
    mut settings_rx: watch::Receiver<Settings>,
    mut delivered: Settings,
) {
    info!("Starting settings sync task");

    while settings_rx.changed().await.is_ok() {
        let latest = settings_rx.borrow_and_update().clone();
        let updates = delivered.updates_since(&latest);
        delivered = latest;

        let Some(engine) = engine.upgrade() else {
            return;
        };
        debug!("Delivering {} settings update(s)", updates.len());
        engine.apply_settings(&updates);
    }

    debug!("Settings store closed, stopping sync");
}
