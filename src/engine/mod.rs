//! Timer engine
//!
//! [`TimerEngine`] owns the authoritative timer state and the background
//! tasks that move it forward. All mutation goes through a single mutex;
//! each change is published as a [`TimerState`] snapshot on a `watch`
//! channel.
//!
//! Settings edits are written through to the [`SettingsStore`] and only
//! take effect when the store echoes them back, so a value typed by the
//! user never races a tick in progress.

pub mod runtime;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::{runtime::Handle, sync::watch};
use tracing::{debug, info, warn};

pub use runtime::{Boundary, Runtime, TickOutcome};

use crate::{
    languages::{self, Locale},
    services::{ChimeRenderer, SettingsStore, CHIME_BASE_NAME},
    state::{format_clock, Settings, SettingsUpdate, StartDuration, TimerState},
    tasks::{post_boundary_reset_task, settings_sync_task, ticker_task, TaskSlot},
};

#[derive(Debug)]
struct Shared {
    runtime: Mutex<Runtime>,
    state_tx: watch::Sender<TimerState>,
    ticker: TaskSlot,
    post_boundary: TaskSlot,
    settings_sync: TaskSlot,
    store: Arc<dyn SettingsStore>,
    chime: Arc<dyn ChimeRenderer>,
    /// Used to resolve a blank language tag
    device_locale: Locale,
}

impl Shared {
    fn lock_runtime(&self) -> MutexGuard<'_, Runtime> {
        self.runtime.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a timer engine; clones share the same timer
#[derive(Debug, Clone)]
pub struct TimerEngine {
    shared: Arc<Shared>,
}

/// Non-owning handle held by background tasks.
///
/// When the last [`TimerEngine`] is dropped its tasks are aborted and any
/// task still holding a `WeakEngine` finds nothing to upgrade.
#[derive(Debug, Clone)]
pub struct WeakEngine(Weak<Shared>);

impl WeakEngine {
    pub fn upgrade(&self) -> Option<TimerEngine> {
        self.0.upgrade().map(|shared| TimerEngine { shared })
    }
}

impl TimerEngine {
    /// Create an engine initialized from the store's current settings.
    ///
    /// When called inside a tokio runtime, later settings changes are
    /// picked up by a background subscription.
    pub fn new(
        store: Arc<dyn SettingsStore>,
        chime: Arc<dyn ChimeRenderer>,
        device_locale: Locale,
    ) -> Self {
        let runtime = Runtime::new();
        let (state_tx, _) = watch::channel(runtime.snapshot());
        let mut settings_rx = store.subscribe();

        let engine = Self {
            shared: Arc::new(Shared {
                runtime: Mutex::new(runtime),
                state_tx,
                ticker: TaskSlot::new("ticker"),
                post_boundary: TaskSlot::new("post-boundary reset"),
                settings_sync: TaskSlot::new("settings sync"),
                store,
                chime,
                device_locale,
            }),
        };

        let initial = settings_rx.borrow_and_update().clone();
        engine.apply_settings(&initial.as_updates());
        info!(
            "Timer engine ready: {} {}",
            if initial.count_up_enabled { "count-up" } else { "count-down" },
            format_clock(initial.start_duration().total_seconds())
        );

        match Handle::try_current() {
            Ok(handle) => {
                let task = settings_sync_task(engine.downgrade(), settings_rx, initial);
                engine.shared.settings_sync.replace(handle.spawn(task));
            }
            Err(_) => warn!("No async runtime; settings changes will not reach the timer"),
        }

        engine
    }

    pub fn downgrade(&self) -> WeakEngine {
        WeakEngine(Arc::downgrade(&self.shared))
    }

    /// Receiver for state snapshots
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.shared.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> TimerState {
        self.shared.lock_runtime().snapshot()
    }

    /// Whether an advancement loop is currently scheduled
    pub fn has_active_loop(&self) -> bool {
        self.shared.ticker.is_active()
    }

    /// Run `f` against the runtime and publish the resulting snapshot
    fn update<R>(&self, f: impl FnOnce(&mut Runtime) -> R) -> R {
        self.update_with_tasks(f, |_, _| {})
    }

    /// Like [`Self::update`], with `tasks` run before the runtime lock is
    /// released. Task slots are only touched from here, so a slot always
    /// matches the state it was changed for.
    fn update_with_tasks<R>(
        &self,
        f: impl FnOnce(&mut Runtime) -> R,
        tasks: impl FnOnce(&Shared, &R),
    ) -> R {
        let mut runtime = self.shared.lock_runtime();
        let result = f(&mut runtime);
        let snapshot = runtime.snapshot();
        // Published under the lock so watchers never see snapshots out of order
        self.shared.state_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
        tasks(&self.shared, &result);
        drop(runtime);
        result
    }

    /// Begin advancing, replacing any previous loop.
    ///
    /// No-op if already running, if a count-down sits at zero, or if a
    /// count-up has nothing left to count.
    pub fn start(&self) {
        let Ok(handle) = Handle::try_current() else {
            warn!("No async runtime; cannot start timer");
            return;
        };
        let weak = self.downgrade();
        let started = self.update_with_tasks(Runtime::begin_run, |shared, generation| {
            if let Some(generation) = *generation {
                shared.ticker.replace(handle.spawn(ticker_task(weak, generation)));
            }
        });

        match started {
            Some(_) => info!("Timer started at {}", self.snapshot().display()),
            None => debug!("Start ignored: {:?}", self.snapshot()),
        }
    }

    /// Stop advancing. Idempotent.
    pub fn stop(&self) {
        let was_running = self.update_with_tasks(
            |rt| {
                let was_running = rt.is_running();
                rt.halt();
                was_running
            },
            |shared, _| shared.ticker.cancel(),
        );
        if was_running {
            info!("Timer stopped at {}", self.snapshot().display());
        }
    }

    /// Stop and restore the idle value: 0 for count-up, the configured total for count-down
    pub fn reset_to_start(&self) {
        self.update_with_tasks(
            |rt| {
                rt.halt();
                rt.cancel_post_boundary_reset();
                rt.reset_to_idle();
            },
            |shared, _| {
                shared.ticker.cancel();
                shared.post_boundary.cancel();
            },
        );
        debug!("Timer reset to {}", self.snapshot().display());
    }

    /// Single tap: pause if running, otherwise try to start
    pub fn toggle_start_pause(&self) {
        let running = self.update_with_tasks(
            |rt| {
                rt.cancel_post_boundary_reset();
                rt.is_running()
            },
            |shared, _| shared.post_boundary.cancel(),
        );
        if running {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Reset to the idle value and start immediately
    pub fn tap_to_restart_and_start(&self) {
        self.reset_to_start();
        self.start();
    }

    /// Reset to the idle value without starting
    pub fn double_tap_to_reset_only(&self) {
        self.reset_to_start();
    }

    /// Stop every background task owned by this engine
    pub fn shutdown(&self) {
        self.update_with_tasks(
            |rt| {
                rt.halt();
                rt.cancel_post_boundary_reset();
            },
            |shared, _| {
                shared.ticker.cancel();
                shared.post_boundary.cancel();
                shared.settings_sync.cancel();
            },
        );
        info!("Timer engine shut down");
    }

    /// Snap an active count-down down to `target` seconds; keeps the running state
    pub fn lower_active_countdown_to(&self, target: i64) {
        if self.update(|rt| rt.lower_countdown_to(target)) {
            info!("Countdown lowered to {}", self.snapshot().display());
        }
    }

    /// Snap an active count-up up to `target` seconds; keeps the running state
    pub fn raise_active_count_up_to(&self, target: i64) {
        if self.update(|rt| rt.raise_count_up_to(target)) {
            info!("Count-up raised to {}", self.snapshot().display());
        }
    }

    /// Write a whole settings submission as one store snapshot, in order
    pub fn save_settings(&self, updates: Vec<SettingsUpdate>) {
        if !updates.is_empty() {
            self.shared.store.write_all(updates);
        }
    }

    pub fn set_start(&self, minutes: i64, seconds: i64) {
        let duration = StartDuration::clamped(minutes, seconds);
        self.shared.store.write(SettingsUpdate::StartDuration(duration));
    }

    pub fn set_chime_enabled(&self, enabled: bool) {
        self.shared.store.write(SettingsUpdate::ChimeEnabled(enabled));
    }

    pub fn set_keep_screen_on(&self, enabled: bool) {
        self.shared.store.write(SettingsUpdate::KeepScreenOn(enabled));
    }

    pub fn set_help_icon_visible(&self, visible: bool) {
        self.shared.store.write(SettingsUpdate::HelpIconVisible(visible));
    }

    pub fn set_language_icon_visible(&self, visible: bool) {
        self.shared.store.write(SettingsUpdate::LanguageIconVisible(visible));
    }

    pub fn set_count_up_enabled(&self, enabled: bool) {
        self.shared.store.write(SettingsUpdate::CountUpEnabled(enabled));
    }

    pub fn set_language_tag(&self, tag: &str) {
        self.shared.store.write(SettingsUpdate::LanguageTag(tag.to_string()));
    }

    /// Settings as currently stored
    pub fn settings(&self) -> Settings {
        self.shared.store.current()
    }

    /// Reconcile settings values echoed by the store, in order
    pub fn apply_settings(&self, updates: &[SettingsUpdate]) {
        let locale = &self.shared.device_locale;
        self.update(|rt| {
            for update in updates {
                debug!("Reconciling {:?}", update);
                match update {
                    SettingsUpdate::StartDuration(d) => rt.on_start_duration(*d),
                    SettingsUpdate::CountUpEnabled(v) => rt.on_count_up_enabled(*v),
                    SettingsUpdate::ChimeEnabled(v) => rt.on_chime_enabled(*v),
                    SettingsUpdate::KeepScreenOn(v) => rt.on_keep_screen_on(*v),
                    SettingsUpdate::HelpIconVisible(v) => rt.on_help_icon_visible(*v),
                    SettingsUpdate::LanguageIconVisible(v) => rt.on_language_icon_visible(*v),
                    SettingsUpdate::LanguageTag(tag) => {
                        rt.on_language_tag(tag, || languages::best_match_for(locale))
                    }
                }
            }
        });
    }

    /// One tick on behalf of loop `generation`; `false` ends the loop
    pub(crate) fn advance(&self, generation: u64) -> bool {
        let handle = Handle::try_current().ok();
        let weak = self.downgrade();
        let (outcome, chime_enabled, _) = self.update_with_tasks(
            |rt| {
                let outcome = rt.tick(generation);
                let reset = match outcome {
                    TickOutcome::Boundary(boundary) => {
                        Some((boundary, rt.arm_post_boundary_reset()))
                    }
                    _ => None,
                };
                (outcome, rt.chime_enabled(), reset)
            },
            |shared, (_, _, reset)| {
                let Some((boundary, reset_generation)) = *reset else {
                    return;
                };
                match &handle {
                    Some(handle) => {
                        let task = post_boundary_reset_task(weak, reset_generation, boundary);
                        shared.post_boundary.replace(handle.spawn(task));
                    }
                    None => warn!("No async runtime; post-boundary reset skipped"),
                }
            },
        );

        match outcome {
            TickOutcome::Continue => true,
            TickOutcome::Boundary(boundary) => {
                info!("Timer reached boundary: {:?}", boundary);
                if chime_enabled {
                    self.shared.chime.play(CHIME_BASE_NAME);
                }
                false
            }
            TickOutcome::Stale => false,
        }
    }

    pub(crate) fn finish_post_boundary_reset(&self, generation: u64, boundary: Boundary) {
        if self.update(|rt| rt.apply_post_boundary_reset(generation, boundary)) {
            debug!("Post-boundary reset to {}", self.snapshot().display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemorySettingsStore;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };
    use tokio::time::sleep;

    #[derive(Debug, Default)]
    struct RecordingChime {
        plays: AtomicUsize,
    }

    impl RecordingChime {
        fn count(&self) -> usize {
            self.plays.load(Ordering::SeqCst)
        }
    }

    impl ChimeRenderer for RecordingChime {
        fn play(&self, base_name: &str) {
            assert_eq!(base_name, CHIME_BASE_NAME);
            self.plays.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        engine: TimerEngine,
        store: Arc<MemorySettingsStore>,
        chime: Arc<RecordingChime>,
    }

    fn harness(total_seconds: i64, count_up: bool) -> Harness {
        let store = Arc::new(MemorySettingsStore::new(Settings {
            start_minutes: total_seconds / 60,
            start_seconds: total_seconds % 60,
            count_up_enabled: count_up,
            ..Settings::default()
        }));
        let chime = Arc::new(RecordingChime::default());
        let engine = TimerEngine::new(store.clone(), chime.clone(), Locale::parse("en_US"));
        Harness { engine, store, chime }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn millis(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_chimes_then_resets_after_one_second() {
        let h = harness(5, false);
        assert_eq!(h.engine.snapshot().remaining_seconds, 5);

        h.engine.start();
        sleep(millis(4_500)).await;
        assert_eq!(h.engine.snapshot().remaining_seconds, 1);
        assert!(h.engine.snapshot().is_running);

        sleep(millis(1_000)).await;
        let state = h.engine.snapshot();
        assert_eq!(state.remaining_seconds, 0);
        assert!(!state.is_running);
        assert_eq!(h.chime.count(), 1);

        sleep(millis(1_000)).await;
        let state = h.engine.snapshot();
        assert_eq!(state.remaining_seconds, 5);
        assert!(!state.is_running);
        assert_eq!(h.chime.count(), 1);
        assert!(!h.engine.has_active_loop());
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_chime_still_resets() {
        let h = harness(2, false);
        h.engine.apply_settings(&[SettingsUpdate::ChimeEnabled(false)]);
        h.engine.start();
        sleep(millis(3_500)).await;
        assert_eq!(h.chime.count(), 0);
        assert_eq!(h.engine.snapshot().remaining_seconds, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn countup_stops_at_limit_then_returns_to_zero() {
        let h = harness(3, true);
        // First duration initializes the value to the total, whatever the mode
        assert_eq!(h.engine.snapshot().remaining_seconds, 3);
        h.engine.start();
        assert!(!h.engine.snapshot().is_running);

        h.engine.double_tap_to_reset_only();
        assert_eq!(h.engine.snapshot().remaining_seconds, 0);
        h.engine.start();
        sleep(millis(3_500)).await;
        let state = h.engine.snapshot();
        assert_eq!(state.remaining_seconds, 3);
        assert!(!state.is_running);
        assert_eq!(h.chime.count(), 1);

        sleep(millis(1_000)).await;
        assert_eq!(h.engine.snapshot().remaining_seconds, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_never_doubles_the_loop() {
        let h = harness(10, false);
        h.engine.start();
        sleep(millis(1_500)).await;
        assert_eq!(h.engine.snapshot().remaining_seconds, 9);

        for _ in 0..5 {
            h.engine.stop();
            h.engine.start();
            h.engine.start();
        }
        sleep(millis(2_900)).await;
        assert_eq!(h.engine.snapshot().remaining_seconds, 7);

        h.engine.toggle_start_pause();
        assert!(!h.engine.snapshot().is_running);
        sleep(millis(5_000)).await;
        assert_eq!(h.engine.snapshot().remaining_seconds, 7);

        h.engine.toggle_start_pause();
        sleep(millis(1_100)).await;
        assert_eq!(h.engine.snapshot().remaining_seconds, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_at_zero_cancels_reset_without_starting() {
        let h = harness(1, false);
        h.engine.start();
        sleep(millis(1_500)).await;
        assert_eq!(h.engine.snapshot().remaining_seconds, 0);

        h.engine.toggle_start_pause();
        assert!(!h.engine.snapshot().is_running);
        sleep(millis(2_000)).await;
        assert_eq!(h.engine.snapshot().remaining_seconds, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_during_reset_window_is_not_clobbered() {
        let h = harness(5, false);
        h.engine.start();
        sleep(millis(5_500)).await;
        assert_eq!(h.engine.snapshot().remaining_seconds, 0);

        h.engine.tap_to_restart_and_start();
        assert!(h.engine.snapshot().is_running);
        h.engine.lower_active_countdown_to(2);
        // The cancelled reset would have fired at 6.0s
        sleep(millis(700)).await;
        let state = h.engine.snapshot();
        assert_eq!(state.remaining_seconds, 2);
        assert!(state.is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn double_tap_resets_without_starting() {
        let h = harness(30, false);
        h.engine.start();
        sleep(millis(3_500)).await;
        h.engine.double_tap_to_reset_only();
        let state = h.engine.snapshot();
        assert_eq!(state.remaining_seconds, 30);
        assert!(!state.is_running);
        sleep(millis(3_000)).await;
        assert_eq!(h.engine.snapshot().remaining_seconds, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_starts_from_configured_total() {
        let h = harness(30, false);
        h.engine.start();
        sleep(millis(3_500)).await;
        h.engine.tap_to_restart_and_start();
        let state = h.engine.snapshot();
        assert_eq!(state.remaining_seconds, 30);
        assert!(state.is_running);
        sleep(millis(1_000)).await;
        assert_eq!(h.engine.snapshot().remaining_seconds, 29);
    }

    #[tokio::test(start_paused = true)]
    async fn mode_switch_while_idle_zeroes_countup() {
        let h = harness(10, false);
        h.engine.lower_active_countdown_to(3);
        h.engine.set_count_up_enabled(true);
        settle().await;
        let state = h.engine.snapshot();
        assert!(state.is_count_up);
        assert_eq!(state.remaining_seconds, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn switch_to_countdown_picks_up_new_duration() {
        let h = harness(120, true);
        h.engine.double_tap_to_reset_only();
        h.engine.raise_active_count_up_to(40);

        h.engine.save_settings(vec![
            SettingsUpdate::CountUpEnabled(false),
            SettingsUpdate::StartDuration(StartDuration::clamped(0, 45)),
        ]);
        settle().await;
        let state = h.engine.snapshot();
        assert!(!state.is_count_up);
        assert_eq!(state.total_seconds, 45);
        assert_eq!(state.remaining_seconds, 45);
    }

    #[tokio::test(start_paused = true)]
    async fn mode_switch_adjust_does_not_outlive_its_submission() {
        let h = harness(120, true);
        h.engine.save_settings(vec![
            SettingsUpdate::CountUpEnabled(false),
            SettingsUpdate::StartDuration(StartDuration::clamped(2, 0)),
        ]);
        settle().await;
        assert_eq!(h.engine.snapshot().remaining_seconds, 120);

        h.engine.start();
        sleep(millis(20_500)).await;
        h.engine.stop();
        assert_eq!(h.engine.snapshot().remaining_seconds, 100);

        // A later, unrelated duration edit only moves the total
        h.engine.set_start(2, 30);
        settle().await;
        let state = h.engine.snapshot();
        assert_eq!(state.total_seconds, 150);
        assert_eq!(state.remaining_seconds, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn mode_switch_alone_settles_on_current_total() {
        let h = harness(90, true);
        h.engine.set_count_up_enabled(false);
        settle().await;
        assert_eq!(h.engine.snapshot().remaining_seconds, 90);

        h.engine.lower_active_countdown_to(30);
        h.engine.set_start(0, 50);
        settle().await;
        let state = h.engine.snapshot();
        assert_eq!(state.total_seconds, 50);
        assert_eq!(state.remaining_seconds, 30);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_start_stop_keeps_loop_in_step_with_state() {
        let h = harness(600, false);
        for _ in 0..200 {
            let (a, b) = (h.engine.clone(), h.engine.clone());
            let stopper = tokio::spawn(async move { a.stop() });
            let starter = tokio::spawn(async move { b.start() });
            stopper.await.unwrap();
            starter.await.unwrap();
            assert_eq!(h.engine.snapshot().is_running, h.engine.has_active_loop());
        }
        h.engine.shutdown();
        assert!(!h.engine.has_active_loop());
    }

    #[tokio::test(start_paused = true)]
    async fn shorter_duration_does_not_snap_running_countdown() {
        let h = harness(120, false);
        h.engine.start();
        sleep(millis(30_500)).await;
        assert_eq!(h.engine.snapshot().remaining_seconds, 90);

        h.engine.set_start(1, 0);
        settle().await;
        let state = h.engine.snapshot();
        assert_eq!(state.total_seconds, 60);
        assert_eq!(state.remaining_seconds, 90);
        assert!(state.is_running);

        h.engine.lower_active_countdown_to(60);
        let state = h.engine.snapshot();
        assert_eq!(state.remaining_seconds, 60);
        assert!(state.is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_mid_run_then_lowered_stops_on_next_tick() {
        let h = harness(10, false);
        h.engine.start();
        sleep(millis(1_500)).await;
        h.engine.set_start(0, 0);
        settle().await;
        assert_eq!(h.engine.snapshot().remaining_seconds, 9);

        h.engine.lower_active_countdown_to(0);
        assert!(h.engine.snapshot().is_running);
        sleep(millis(1_000)).await;
        let state = h.engine.snapshot();
        assert!(!state.is_running);
        assert_eq!(state.remaining_seconds, 0);
        assert_eq!(h.chime.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_language_resolves_from_device_locale() {
        let store = Arc::new(MemorySettingsStore::default());
        let chime = Arc::new(RecordingChime::default());
        let engine = TimerEngine::new(store.clone(), chime, Locale::parse("pt_BR.UTF-8"));
        assert_eq!(engine.snapshot().language_tag, "pt-BR");
        // Resolution is not written back
        assert_eq!(store.current().language_tag, "");

        engine.set_language_tag("uk");
        settle().await;
        assert_eq!(engine.snapshot().language_tag, "uk");
    }

    #[tokio::test(start_paused = true)]
    async fn snapshots_are_published() {
        let h = harness(3, false);
        let mut rx = h.engine.subscribe();
        rx.borrow_and_update();
        h.engine.start();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_running);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().remaining_seconds, 2);
        drop(h.store);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_engine_stops_its_loop() {
        let h = harness(10, false);
        let weak = h.engine.downgrade();
        h.engine.start();
        drop(h.engine);
        sleep(millis(3_000)).await;
        assert!(weak.upgrade().is_none());
    }
}
