//! Pending "apply new duration to the active timer?" prompt

use serde::{Deserialize, Serialize};

use super::TimerState;

/// Target offered to the user after saving a new start duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Confirmation {
    /// Count-down is above the new duration; offer to lower it
    Lower(u64),
    /// Count-up is below the new duration; offer to raise it
    Raise(u64),
}

impl Confirmation {
    /// Decide whether saving `new_start` seconds should prompt the user.
    ///
    /// Only an active timer (running, or paused away from zero) is offered
    /// an adjustment.
    pub fn for_new_start(state: &TimerState, new_start: u64) -> Option<Self> {
        let active = state.is_running || state.remaining_seconds > 0;
        if !active {
            return None;
        }
        if state.is_count_up {
            (state.remaining_seconds < new_start).then_some(Self::Raise(new_start))
        } else {
            (state.remaining_seconds > new_start).then_some(Self::Lower(new_start))
        }
    }

    pub fn target(&self) -> u64 {
        match self {
            Self::Lower(t) | Self::Raise(t) => *t,
        }
    }

    /// The running timer already passed the target on its own
    pub fn is_stale(&self, state: &TimerState) -> bool {
        if !state.is_running {
            return false;
        }
        match self {
            Self::Lower(t) => state.remaining_seconds <= *t,
            Self::Raise(t) => state.remaining_seconds >= *t,
        }
    }
}
