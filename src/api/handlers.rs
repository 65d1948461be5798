//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{error, info};

use crate::{
    languages,
    state::{AppState, Confirmation, Settings, SettingsUpdate, StartDuration},
};
use super::responses::{
    ApiResponse, HealthResponse, LanguageEntry, SettingsRequest, SettingsResponse, StatusResponse,
};

/// Record the action and describe the resulting timer state
fn respond(state: &AppState, action: &str, message: &str) -> Json<ApiResponse> {
    state.record_action(action);
    let timer = state.engine.snapshot();
    info!("{} -> {}", action, timer.display());
    Json(ApiResponse::new(message.to_string(), timer))
}

/// Handle POST /toggle - Single tap: start or pause
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.engine.toggle_start_pause();
    let message = if state.engine.snapshot().is_running { "Timer running" } else { "Timer paused" };
    respond(&state, "toggle", message)
}

/// Handle POST /start - Start if the preconditions allow it
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.engine.start();
    respond(&state, "start", "Start requested")
}

/// Handle POST /stop - Pause the timer
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.engine.stop();
    respond(&state, "stop", "Timer stopped")
}

/// Handle POST /reset - Stop and return to the start value
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.engine.reset_to_start();
    respond(&state, "reset", "Timer reset")
}

/// Handle POST /restart - Reset to the start value and start immediately
pub async fn restart_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.engine.tap_to_restart_and_start();
    respond(&state, "restart", "Timer restarted")
}

/// Handle POST /double-tap - Reset to the start value, never start
pub async fn double_tap_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.engine.double_tap_to_reset_only();
    respond(&state, "double-tap", "Timer reset")
}

/// Handle POST /confirm - Apply the offered adjustment to the active timer
pub async fn confirm_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    match state.confirm_pending() {
        Ok(Some(confirmation)) => {
            let verb = match confirmation {
                Confirmation::Lower(_) => "Lowered",
                Confirmation::Raise(_) => "Raised",
            };
            let message = format!("{} to {}s", verb, confirmation.target());
            Ok(respond(&state, "confirm", &message))
        }
        Ok(None) => Ok(respond(&state, "confirm", "Nothing to confirm")),
        Err(e) => {
            error!("Failed to confirm adjustment: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /dismiss - Drop the offered adjustment
pub async fn dismiss_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    match state.dismiss_pending() {
        Ok(_) => Ok(respond(&state, "dismiss", "Adjustment dismissed")),
        Err(e) => {
            error!("Failed to dismiss adjustment: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Timer snapshot with presentation hints
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let pending_confirmation = state.get_pending_confirmation().map_err(|e| {
        error!("Failed to read pending confirmation: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let timer = state.engine.snapshot();
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        display: timer.display(),
        rtl: timer.is_rtl(),
        timer,
        pending_confirmation,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.get_uptime()))
}

/// Handle GET /settings - Stored settings
pub async fn get_settings_handler(State(state): State<Arc<AppState>>) -> Json<Settings> {
    Json(state.engine.settings())
}

/// Handle POST /settings - Write the submitted settings through to the store
pub async fn save_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SettingsRequest>,
) -> Result<Json<SettingsResponse>, StatusCode> {
    let before = state.engine.snapshot();
    let stored = state.engine.settings();

    let mut updates = Vec::new();
    if let Some(enabled) = request.chime_enabled {
        updates.push(SettingsUpdate::ChimeEnabled(enabled));
    }
    if let Some(enabled) = request.keep_screen_on {
        updates.push(SettingsUpdate::KeepScreenOn(enabled));
    }
    if let Some(visible) = request.help_icon_visible {
        updates.push(SettingsUpdate::HelpIconVisible(visible));
    }
    if let Some(visible) = request.language_icon_visible {
        updates.push(SettingsUpdate::LanguageIconVisible(visible));
    }
    if let Some(tag) = request.language_tag {
        updates.push(SettingsUpdate::LanguageTag(tag));
    }

    // Mode before duration so a switch to count-down lands on the new total
    let mode_changed = request
        .count_up_enabled
        .is_some_and(|enabled| enabled != before.is_count_up);
    if let Some(enabled) = request.count_up_enabled {
        updates.push(SettingsUpdate::CountUpEnabled(enabled));
    }

    let mut new_start = None;
    if request.minutes.is_some() || request.seconds.is_some() {
        let current = stored.start_duration();
        let duration = StartDuration::clamped(
            request.minutes.unwrap_or(current.minutes as i64),
            request.seconds.unwrap_or(current.seconds as i64),
        );
        updates.push(SettingsUpdate::StartDuration(duration));
        new_start = Some(duration);
    }

    // One store snapshot per submission
    state.engine.save_settings(updates);

    let confirmation = match new_start {
        Some(duration) if !mode_changed => {
            state.offer_confirmation(duration.total_seconds(), &before).map_err(|e| {
                error!("Failed to record pending confirmation: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
        }
        _ => None,
    };

    state.record_action("settings");
    Ok(Json(SettingsResponse {
        settings: state.engine.settings(),
        confirmation,
    }))
}

/// Handle GET /languages - Supported languages in picker order
pub async fn languages_handler() -> Json<Vec<LanguageEntry>> {
    Json(
        languages::supported_languages()
            .into_iter()
            .map(LanguageEntry::from)
            .collect(),
    )
}
