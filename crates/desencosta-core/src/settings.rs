//! Persisted reminder settings.
//!
//! One record per user, stored as JSON under [`SETTINGS_KEY`] and always
//! written back whole.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{ReminderError, Result, StorageError};
use crate::storage::KeyValueStore;
use crate::window::{ActiveWindow, MAX_DAILY_NOTIFICATIONS};

pub const SETTINGS_KEY: &str = "desencosta_reminders";

/// Reminder preferences edited from the settings screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// `HH:MM`
    #[serde(default = "default_window_start")]
    pub active_window_start: String,
    /// `HH:MM`; at or before the start means the window ends the next day.
    #[serde(default = "default_window_end")]
    pub active_window_end: String,
    #[serde(default = "default_daily_count")]
    pub daily_notification_count: u32,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub vibration_enabled: bool,
    #[serde(default)]
    pub silent_mode: bool,
    /// Overrides the derived polling interval when set.
    #[serde(default)]
    pub frequency_minutes: Option<u32>,
}

fn default_true() -> bool {
    true
}
fn default_window_start() -> String {
    "09:00".into()
}
fn default_window_end() -> String {
    "21:00".into()
}
fn default_daily_count() -> u32 {
    6
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            active_window_start: default_window_start(),
            active_window_end: default_window_end(),
            daily_notification_count: default_daily_count(),
            sound_enabled: true,
            vibration_enabled: true,
            silent_mode: false,
            frequency_minutes: None,
        }
    }
}

impl ReminderSettings {
    /// Parse the active window.
    ///
    /// # Errors
    /// `InvalidConfiguration` when either bound is not a valid `HH:MM` time.
    pub fn window(&self) -> Result<ActiveWindow, ReminderError> {
        let start = parse_clock("active_window_start", &self.active_window_start)?;
        let end = parse_clock("active_window_end", &self.active_window_end)?;
        Ok(ActiveWindow::new(start, end))
    }

    /// Check every field that feeds the schedule.
    pub fn validate(&self) -> Result<(), ReminderError> {
        self.window()?;
        if self.daily_notification_count == 0
            || self.daily_notification_count as usize > MAX_DAILY_NOTIFICATIONS
        {
            return Err(ReminderError::invalid(
                "daily_notification_count",
                format!(
                    "must be between 1 and {MAX_DAILY_NOTIFICATIONS}, got {}",
                    self.daily_notification_count
                ),
            ));
        }
        if self.frequency_minutes == Some(0) {
            return Err(ReminderError::invalid(
                "frequency_minutes",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Sound is allowed only outside silent mode.
    pub fn plays_sound(&self) -> bool {
        self.sound_enabled && !self.silent_mode
    }

    /// Vibration is allowed only outside silent mode.
    pub fn vibrates(&self) -> bool {
        self.vibration_enabled && !self.silent_mode
    }

    /// Load from the store, falling back to defaults on first run.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
        match store.get(SETTINGS_KEY)? {
            Some(json) => serde_json::from_str(&json).map_err(|e| {
                StorageError::Malformed {
                    key: SETTINGS_KEY.to_string(),
                    message: e.to_string(),
                }
                .into()
            }),
            None => Ok(Self::default()),
        }
    }

    /// Overwrite the stored record.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        let json = serde_json::to_string(self).map_err(|e| StorageError::Malformed {
            key: SETTINGS_KEY.to_string(),
            message: e.to_string(),
        })?;
        store.set(SETTINGS_KEY, &json)?;
        Ok(())
    }
}

fn parse_clock(field: &str, value: &str) -> Result<NaiveTime, ReminderError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ReminderError::invalid(field, format!("'{value}' is not a HH:MM time")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn defaults_match_first_run() {
        let s = ReminderSettings::default();
        assert!(s.enabled);
        assert_eq!(s.active_window_start, "09:00");
        assert_eq!(s.active_window_end, "21:00");
        assert_eq!(s.daily_notification_count, 6);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn silent_mode_overrides_sound_and_vibration() {
        let s = ReminderSettings {
            silent_mode: true,
            ..Default::default()
        };
        assert!(!s.plays_sound());
        assert!(!s.vibrates());
    }

    #[test]
    fn malformed_time_is_invalid_configuration() {
        let s = ReminderSettings {
            active_window_start: "9h".into(),
            ..Default::default()
        };
        match s.validate() {
            Err(ReminderError::InvalidConfiguration { field, .. }) => {
                assert_eq!(field, "active_window_start")
            }
            other => panic!("expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn count_out_of_range_is_rejected() {
        for count in [0, 21] {
            let s = ReminderSettings {
                daily_notification_count: count,
                ..Default::default()
            };
            assert!(s.validate().is_err(), "count {count} should be rejected");
        }
    }

    #[test]
    fn load_returns_defaults_then_saved_record() {
        let store = MemoryStore::new();
        assert_eq!(
            ReminderSettings::load(&store).unwrap(),
            ReminderSettings::default()
        );

        let custom = ReminderSettings {
            daily_notification_count: 10,
            silent_mode: true,
            ..Default::default()
        };
        custom.save(&store).unwrap();
        assert_eq!(ReminderSettings::load(&store).unwrap(), custom);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let parsed: ReminderSettings = serde_json::from_str(r#"{"enabled": false}"#).unwrap();
        assert!(!parsed.enabled);
        assert_eq!(parsed.daily_notification_count, 6);
        assert_eq!(parsed.frequency_minutes, None);
    }
}
