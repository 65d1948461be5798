//! Observable timer snapshot and clock formatting

use serde::{Deserialize, Serialize};

use crate::languages;

/// Snapshot of the engine published after every change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub total_seconds: u64,
    /// Seconds left when counting down, seconds elapsed when counting up
    pub remaining_seconds: u64,
    pub is_running: bool,
    pub chime_enabled: bool,
    pub keep_screen_on: bool,
    pub help_icon_visible: bool,
    pub language_icon_visible: bool,
    pub is_count_up: bool,
    pub language_tag: String,
}

impl TimerState {
    pub fn minutes(&self) -> u64 {
        self.remaining_seconds / 60
    }

    pub fn seconds(&self) -> u64 {
        self.remaining_seconds % 60
    }

    /// Clock text for the current value
    pub fn display(&self) -> String {
        format_clock(self.remaining_seconds)
    }

    /// Whether the current language lays out right-to-left
    pub fn is_rtl(&self) -> bool {
        languages::is_rtl(&self.language_tag)
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            total_seconds: 120,
            remaining_seconds: 120,
            is_running: false,
            chime_enabled: false,
            keep_screen_on: true,
            help_icon_visible: true,
            language_icon_visible: true,
            is_count_up: false,
            language_tag: languages::FALLBACK_TAG.to_string(),
        }
    }
}

/// Format seconds as `M:SS`, or `MM:SS` once minutes reach two digits
pub fn format_clock(total_seconds: u64) -> String {
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    if minutes >= 10 {
        format!("{:02}:{:02}", minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
