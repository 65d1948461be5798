//! Persisted user settings and their key space

use serde::{Deserialize, Serialize};

/// Store keys, shared by every settings backend
pub mod keys {
    pub const START_MINUTES: &str = "start_minutes";
    pub const START_SECONDS: &str = "start_seconds";
    pub const CHIME_ENABLED: &str = "chime_enabled";
    pub const KEEP_SCREEN_ON: &str = "keep_screen_on";
    pub const HELP_ICON_VISIBLE: &str = "help_icon_visible";
    pub const LANGUAGE_ICON_VISIBLE: &str = "language_icon_visible";
    pub const COUNT_UP_ENABLED: &str = "count_up_enabled";
    pub const LANGUAGE_TAG: &str = "language_tag";
    pub const INITIALIZED: &str = "initialized";
}

pub const DEFAULT_START_MINUTES: u64 = 2;
pub const DEFAULT_START_SECONDS: u64 = 0;

/// Configured start duration, always stored in its clamped form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartDuration {
    pub minutes: u64,
    pub seconds: u64,
}

impl StartDuration {
    /// Build a duration from raw user input.
    ///
    /// Negative minutes become 0 and seconds are forced into 0..=59.
    pub fn clamped(minutes: i64, seconds: i64) -> Self {
        Self {
            minutes: minutes.max(0) as u64,
            seconds: seconds.clamp(0, 59) as u64,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.minutes.saturating_mul(60).saturating_add(self.seconds)
    }
}

impl Default for StartDuration {
    fn default() -> Self {
        Self {
            minutes: DEFAULT_START_MINUTES,
            seconds: DEFAULT_START_SECONDS,
        }
    }
}

/// Snapshot of every persisted setting.
///
/// Field names double as the store keys so the JSON file reads like the
/// key table it mirrors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub start_minutes: i64,
    pub start_seconds: i64,
    pub chime_enabled: bool,
    pub keep_screen_on: bool,
    pub help_icon_visible: bool,
    pub language_icon_visible: bool,
    pub count_up_enabled: bool,
    /// BCP-47 tag; blank means "resolve from the device locale"
    pub language_tag: String,
    pub initialized: bool,
}

impl Settings {
    /// Start duration as read back from the store, clamped
    pub fn start_duration(&self) -> StartDuration {
        StartDuration::clamped(self.start_minutes, self.start_seconds)
    }

    /// Every key as an update, mode ahead of duration.
    ///
    /// A mode switch may leave a pending adjustment that only the duration
    /// that follows it can resolve, so the mode key is always delivered first.
    pub fn as_updates(&self) -> Vec<SettingsUpdate> {
        vec![
            SettingsUpdate::CountUpEnabled(self.count_up_enabled),
            SettingsUpdate::StartDuration(self.start_duration()),
            SettingsUpdate::ChimeEnabled(self.chime_enabled),
            SettingsUpdate::KeepScreenOn(self.keep_screen_on),
            SettingsUpdate::HelpIconVisible(self.help_icon_visible),
            SettingsUpdate::LanguageIconVisible(self.language_icon_visible),
            SettingsUpdate::LanguageTag(self.language_tag.clone()),
        ]
    }

    /// Updates to deliver when the store moves from `self` to `newer`.
    ///
    /// Keys whose value differs are listed in [`Self::as_updates`] order.
    /// The start duration is always included: it is re-emitted on every
    /// store write, which is what settles a pending mode-change adjust.
    pub fn updates_since(&self, newer: &Settings) -> Vec<SettingsUpdate> {
        let before = self.as_updates();
        newer
            .as_updates()
            .into_iter()
            .zip(before)
            .filter(|(after, before)| {
                after != before || matches!(after, SettingsUpdate::StartDuration(_))
            })
            .map(|(after, _)| after)
            .collect()
    }

    /// Apply a single-key write
    pub fn apply(&mut self, update: &SettingsUpdate) {
        match update {
            SettingsUpdate::StartDuration(d) => {
                let d = StartDuration::clamped(d.minutes as i64, d.seconds as i64);
                self.start_minutes = d.minutes as i64;
                self.start_seconds = d.seconds as i64;
            }
            SettingsUpdate::ChimeEnabled(v) => self.chime_enabled = *v,
            SettingsUpdate::KeepScreenOn(v) => self.keep_screen_on = *v,
            SettingsUpdate::HelpIconVisible(v) => self.help_icon_visible = *v,
            SettingsUpdate::LanguageIconVisible(v) => self.language_icon_visible = *v,
            SettingsUpdate::CountUpEnabled(v) => self.count_up_enabled = *v,
            SettingsUpdate::LanguageTag(tag) => {
                self.language_tag = tag.clone();
                self.initialized = true;
            }
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start_minutes: DEFAULT_START_MINUTES as i64,
            start_seconds: DEFAULT_START_SECONDS as i64,
            chime_enabled: true,
            keep_screen_on: false,
            help_icon_visible: true,
            language_icon_visible: true,
            count_up_enabled: false,
            language_tag: String::new(),
            initialized: false,
        }
    }
}

/// One write against the settings store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsUpdate {
    StartDuration(StartDuration),
    ChimeEnabled(bool),
    KeepScreenOn(bool),
    HelpIconVisible(bool),
    LanguageIconVisible(bool),
    CountUpEnabled(bool),
    LanguageTag(String),
}

impl SettingsUpdate {
    /// Store keys written by this update
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            Self::StartDuration(_) => &[keys::START_MINUTES, keys::START_SECONDS],
            Self::ChimeEnabled(_) => &[keys::CHIME_ENABLED],
            Self::KeepScreenOn(_) => &[keys::KEEP_SCREEN_ON],
            Self::HelpIconVisible(_) => &[keys::HELP_ICON_VISIBLE],
            Self::LanguageIconVisible(_) => &[keys::LANGUAGE_ICON_VISIBLE],
            Self::CountUpEnabled(_) => &[keys::COUNT_UP_ENABLED],
            Self::LanguageTag(_) => &[keys::LANGUAGE_TAG, keys::INITIALIZED],
        }
    }
}
