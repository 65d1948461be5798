//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    languages::{self, Language},
    state::{Confirmation, Settings, TimerState},
};

/// Response for every timer action endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub display: String,
    pub timer: TimerState,
}

impl ApiResponse {
    /// Build a response describing `timer` after an action
    pub fn new(message: String, timer: TimerState) -> Self {
        let status = if timer.is_running { "running" } else { "stopped" };
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            display: timer.display(),
            timer,
        }
    }
}

/// Full status, including presentation hints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerState,
    pub display: String,
    pub rtl: bool,
    pub pending_confirmation: Option<Confirmation>,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: String,
}

impl HealthResponse {
    pub fn healthy(uptime: String) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            uptime,
        }
    }
}

/// Settings form; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsRequest {
    pub minutes: Option<i64>,
    pub seconds: Option<i64>,
    pub chime_enabled: Option<bool>,
    pub keep_screen_on: Option<bool>,
    pub help_icon_visible: Option<bool>,
    pub language_icon_visible: Option<bool>,
    pub count_up_enabled: Option<bool>,
    pub language_tag: Option<String>,
}

/// Settings as stored, plus any adjustment offered for the running timer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub settings: Settings,
    pub confirmation: Option<Confirmation>,
}

/// One entry of the language picker
#[derive(Debug, Clone, Serialize)]
pub struct LanguageEntry {
    pub tag: &'static str,
    pub autonym: &'static str,
    pub rtl: bool,
}

impl From<Language> for LanguageEntry {
    fn from(language: Language) -> Self {
        Self {
            tag: language.tag,
            autonym: language.autonym,
            rtl: languages::is_rtl(language.tag),
        }
    }
}
