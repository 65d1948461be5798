//! Server-side application state

use std::{
    sync::Mutex,
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::engine::TimerEngine;
use super::{Confirmation, TimerState};

/// State shared by every HTTP handler
#[derive(Debug)]
pub struct AppState {
    /// The timer itself
    pub engine: TimerEngine,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Adjustment offered after the last duration change, awaiting an answer
    pub pending_confirmation: Mutex<Option<Confirmation>>,
}

impl AppState {
    pub fn new(engine: TimerEngine, port: u16, host: String) -> Self {
        Self {
            engine,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            pending_confirmation: Mutex::new(None),
        }
    }

    /// Remember the most recent user action
    pub fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Decide whether the user should be asked to apply a newly saved start
    /// duration of `new_start` seconds to the timer as it was in `before`
    pub fn offer_confirmation(
        &self,
        new_start: u64,
        before: &TimerState,
    ) -> Result<Option<Confirmation>, String> {
        let confirmation = Confirmation::for_new_start(before, new_start);
        let mut pending = self.pending_confirmation.lock()
            .map_err(|e| format!("Failed to lock pending confirmation: {}", e))?;
        if let Some(c) = confirmation {
            info!("Offering to apply new duration to active timer: {:?}", c);
            *pending = Some(c);
        }
        Ok(*pending)
    }

    /// Pending confirmation, dropping it if the running timer already passed its target
    pub fn get_pending_confirmation(&self) -> Result<Option<Confirmation>, String> {
        let mut pending = self.pending_confirmation.lock()
            .map_err(|e| format!("Failed to lock pending confirmation: {}", e))?;

        if let Some(c) = *pending {
            if c.is_stale(&self.engine.snapshot()) {
                debug!("Auto-dismissing stale confirmation {:?}", c);
                *pending = None;
            }
        }
        Ok(*pending)
    }

    /// Apply the pending adjustment, if any
    pub fn confirm_pending(&self) -> Result<Option<Confirmation>, String> {
        let confirmation = self.get_pending_confirmation()?;
        self.dismiss_pending()?;

        match confirmation {
            Some(Confirmation::Lower(target)) => {
                self.engine.lower_active_countdown_to(target as i64)
            }
            Some(Confirmation::Raise(target)) => {
                self.engine.raise_active_count_up_to(target as i64)
            }
            None => {}
        }
        Ok(confirmation)
    }

    /// Discard the pending adjustment
    pub fn dismiss_pending(&self) -> Result<Option<Confirmation>, String> {
        self.pending_confirmation.lock()
            .map(|mut pending| pending.take())
            .map_err(|e| format!("Failed to lock pending confirmation: {}", e))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
