//! Timer runtime state machine
//!
//! Everything here is synchronous and clock-free. The owning
//! [`TimerEngine`](super::TimerEngine) drives [`Runtime::tick`] once per
//! second and feeds settings values into the `on_*` reconciliation handlers.
//!
//! Loops and delayed resets are identified by generation counters: a task
//! holding an outdated generation finds its work rejected, so a superseded
//! loop can never mutate state even if it wakes up after being replaced.

use tracing::debug;

use crate::state::{StartDuration, TimerState};

/// Which boundary a run stopped at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Count-down reached 0
    ZeroReached,
    /// Count-up reached the configured total
    LimitReached,
}

/// Result of a single advancement step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Boundary(Boundary),
    /// The loop that asked for this tick is no longer the active one
    Stale,
}

#[derive(Debug, Clone)]
pub struct Runtime {
    total_seconds: u64,
    remaining_seconds: u64,
    running: bool,
    count_up: bool,

    chime_enabled: bool,
    keep_screen_on: bool,
    help_icon_visible: bool,
    language_icon_visible: bool,
    language_tag: String,

    start_initialized: bool,
    mode_initialized: bool,
    pending_adjust_on_mode_change: bool,

    run_generation: u64,
    reset_generation: u64,
}

impl Runtime {
    /// Count-down, 120 seconds, idle
    pub fn new() -> Self {
        let defaults = TimerState::default();
        Self {
            total_seconds: defaults.total_seconds,
            remaining_seconds: defaults.remaining_seconds,
            running: false,
            count_up: false,
            chime_enabled: defaults.chime_enabled,
            keep_screen_on: defaults.keep_screen_on,
            help_icon_visible: defaults.help_icon_visible,
            language_icon_visible: defaults.language_icon_visible,
            language_tag: defaults.language_tag,
            start_initialized: false,
            mode_initialized: false,
            pending_adjust_on_mode_change: false,
            run_generation: 0,
            reset_generation: 0,
        }
    }

    pub fn snapshot(&self) -> TimerState {
        TimerState {
            total_seconds: self.total_seconds,
            remaining_seconds: self.remaining_seconds,
            is_running: self.running,
            chime_enabled: self.chime_enabled,
            keep_screen_on: self.keep_screen_on,
            help_icon_visible: self.help_icon_visible,
            language_icon_visible: self.language_icon_visible,
            is_count_up: self.count_up,
            language_tag: self.language_tag.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_count_up(&self) -> bool {
        self.count_up
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    pub fn chime_enabled(&self) -> bool {
        self.chime_enabled
    }

    pub fn pending_adjust_on_mode_change(&self) -> bool {
        self.pending_adjust_on_mode_change
    }

    /// Whether a new run may begin from the current value
    pub fn can_start(&self) -> bool {
        if self.running {
            return false;
        }
        if self.count_up {
            self.total_seconds > 0 && self.remaining_seconds < self.total_seconds
        } else {
            self.remaining_seconds > 0
        }
    }

    /// Mark the timer running and hand out the generation of the new loop.
    ///
    /// Returns `None` when the preconditions for starting do not hold.
    pub fn begin_run(&mut self) -> Option<u64> {
        if !self.can_start() {
            return None;
        }
        self.running = true;
        self.run_generation += 1;
        Some(self.run_generation)
    }

    /// Stop running and invalidate whichever loop is outstanding
    pub fn halt(&mut self) {
        self.running = false;
        self.run_generation += 1;
    }

    fn is_current_run(&self, generation: u64) -> bool {
        self.running && generation == self.run_generation
    }

    /// Advance the value by one second on behalf of loop `generation`
    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        if !self.is_current_run(generation) {
            return TickOutcome::Stale;
        }

        if self.count_up {
            let next = (self.remaining_seconds + 1).min(self.total_seconds);
            self.remaining_seconds = next;
            if next >= self.total_seconds {
                self.running = false;
                return TickOutcome::Boundary(Boundary::LimitReached);
            }
            return TickOutcome::Continue;
        }

        if self.remaining_seconds == 0 {
            // Reachable when the value was lowered to zero mid-run
            self.running = false;
            return TickOutcome::Boundary(Boundary::ZeroReached);
        }
        let next = self.remaining_seconds - 1;
        self.remaining_seconds = next;
        if next == 0 {
            self.running = false;
            return TickOutcome::Boundary(Boundary::ZeroReached);
        }
        TickOutcome::Continue
    }

    /// Value shown when idle: 0 for count-up, the configured total for count-down
    pub fn idle_value(&self) -> u64 {
        if self.count_up {
            0
        } else {
            self.total_seconds
        }
    }

    pub fn reset_to_idle(&mut self) {
        self.remaining_seconds = self.idle_value();
    }

    /// Schedule a new delayed reset, superseding any earlier one
    pub fn arm_post_boundary_reset(&mut self) -> u64 {
        self.reset_generation += 1;
        self.reset_generation
    }

    pub fn cancel_post_boundary_reset(&mut self) {
        self.reset_generation += 1;
    }

    /// Apply the delayed reset armed as `generation`, unless it was cancelled
    pub fn apply_post_boundary_reset(&mut self, generation: u64, boundary: Boundary) -> bool {
        if generation != self.reset_generation {
            return false;
        }
        self.reset_generation += 1;
        self.remaining_seconds = match boundary {
            Boundary::ZeroReached => self.total_seconds,
            Boundary::LimitReached => 0,
        };
        true
    }

    /// Snap the value down to `target` if it is currently above it
    pub fn lower_countdown_to(&mut self, target: i64) -> bool {
        let target = target.max(0) as u64;
        if self.remaining_seconds > target {
            self.remaining_seconds = target;
            return true;
        }
        false
    }

    /// Snap the value up to `target` (capped at the configured total)
    pub fn raise_count_up_to(&mut self, target: i64) -> bool {
        let target = (target.max(0) as u64).min(self.total_seconds);
        if self.remaining_seconds < target {
            self.remaining_seconds = target;
            return true;
        }
        false
    }

    pub fn on_start_duration(&mut self, duration: StartDuration) {
        let total = duration.total_seconds();
        self.total_seconds = total;

        if !self.start_initialized {
            self.remaining_seconds = total;
            self.start_initialized = true;
            return;
        }

        if self.pending_adjust_on_mode_change && !self.count_up && !self.running {
            debug!("Applying pending mode-change adjustment: remaining={}", total);
            self.remaining_seconds = total;
            self.pending_adjust_on_mode_change = false;
        }
    }

    pub fn on_count_up_enabled(&mut self, enabled: bool) {
        if !self.mode_initialized {
            self.count_up = enabled;
            self.mode_initialized = true;
            return;
        }

        let previous = self.count_up;
        self.count_up = enabled;
        if previous == enabled {
            return;
        }

        if self.running {
            // Leave an active run alone
            self.pending_adjust_on_mode_change = false;
        } else if enabled {
            self.remaining_seconds = 0;
            self.pending_adjust_on_mode_change = false;
        } else {
            // The duration may arrive in the same settings submission
            self.remaining_seconds = self.total_seconds;
            self.pending_adjust_on_mode_change = true;
        }
    }

    pub fn on_chime_enabled(&mut self, enabled: bool) {
        self.chime_enabled = enabled;
    }

    pub fn on_keep_screen_on(&mut self, enabled: bool) {
        self.keep_screen_on = enabled;
    }

    pub fn on_help_icon_visible(&mut self, visible: bool) {
        self.help_icon_visible = visible;
    }

    pub fn on_language_icon_visible(&mut self, visible: bool) {
        self.language_icon_visible = visible;
    }

    /// Blank tags resolve through `fallback` without touching the store
    pub fn on_language_tag<F>(&mut self, tag: &str, fallback: F)
    where
        F: FnOnce() -> String,
    {
        let tag = tag.trim();
        self.language_tag = if tag.is_empty() { fallback() } else { tag.to_string() };
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
