//! Foreground reminder decision.
//!
//! [`should_fire`] is evaluated on every poll tick. It persists nothing; the
//! caller resets the last-action timestamp when it fires so the next tick
//! does not fire again.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReminderError, Result, StorageError};
use crate::messages::profile;
use crate::settings::ReminderSettings;
use crate::storage::KeyValueStore;
use crate::urgency::UrgencyLevel;
use crate::window::compute_average_interval;

pub const LAST_ACTION_KEY: &str = "desencosta_last_relaxation";

/// Time between foreground reminders.
///
/// An explicit `frequency_minutes` wins over the window average.
pub fn reminder_interval(settings: &ReminderSettings) -> Result<Duration, ReminderError> {
    let minutes = match settings.frequency_minutes {
        Some(0) => {
            return Err(ReminderError::invalid(
                "frequency_minutes",
                "must be greater than zero",
            ))
        }
        Some(explicit) => explicit,
        None => compute_average_interval(&settings.window()?, settings.daily_notification_count)?,
    };
    Ok(Duration::minutes(i64::from(minutes)))
}

/// Whether a reminder is due.
///
/// Never fires when reminders are disabled or when there is no baseline yet.
pub fn should_fire(
    settings: &ReminderSettings,
    last_action: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<bool, ReminderError> {
    if !settings.enabled {
        return Ok(false);
    }
    let Some(last) = last_action else {
        return Ok(false);
    };
    Ok(now - last >= reminder_interval(settings)?)
}

/// What the UI should do when a reminder fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub urgency_level: UrgencyLevel,
    pub play_sound: bool,
    /// `None` when vibration is off or silenced.
    pub vibration_pattern: Option<Vec<u64>>,
}

/// Silent mode keeps the popup and drops sound and vibration.
pub fn presentation(settings: &ReminderSettings, level: UrgencyLevel) -> Presentation {
    Presentation {
        urgency_level: level,
        play_sound: settings.plays_sound(),
        vibration_pattern: settings
            .vibrates()
            .then(|| profile(level).vibration_pattern.to_vec()),
    }
}

pub fn load_last_action(store: &dyn KeyValueStore) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = store.get(LAST_ACTION_KEY)? else {
        return Ok(None);
    };
    let parsed = DateTime::parse_from_rfc3339(raw.trim()).map_err(|e| StorageError::Malformed {
        key: LAST_ACTION_KEY.to_string(),
        message: e.to_string(),
    })?;
    Ok(Some(parsed.with_timezone(&Utc)))
}

pub fn store_last_action(store: &dyn KeyValueStore, at: DateTime<Utc>) -> Result<()> {
    store.set(LAST_ACTION_KEY, &at.to_rfc3339())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 3, 12)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn disabled_never_fires() {
        let settings = ReminderSettings {
            enabled: false,
            ..Default::default()
        };
        assert!(!should_fire(&settings, Some(at(0, 0)), at(23, 0)).unwrap());
    }

    #[test]
    fn missing_baseline_never_fires() {
        assert!(!should_fire(&ReminderSettings::default(), None, at(23, 0)).unwrap());
    }

    #[test]
    fn fires_once_interval_elapsed() {
        // 12h window / 6 = 120 minutes.
        let settings = ReminderSettings::default();
        assert_eq!(reminder_interval(&settings).unwrap(), Duration::minutes(120));
        assert!(!should_fire(&settings, Some(at(7, 0)), at(8, 59)).unwrap());
        assert!(should_fire(&settings, Some(at(7, 0)), at(9, 0)).unwrap());
        assert!(should_fire(&settings, Some(at(7, 0)), at(9, 25)).unwrap());
    }

    #[test]
    fn explicit_frequency_overrides_average() {
        let settings = ReminderSettings {
            frequency_minutes: Some(144),
            ..Default::default()
        };
        assert!(!should_fire(&settings, Some(at(7, 0)), at(9, 23)).unwrap());
        assert!(should_fire(&settings, Some(at(7, 0)), at(9, 24)).unwrap());
        assert!(should_fire(&settings, Some(at(7, 0)), at(9, 25)).unwrap());
    }

    #[test]
    fn invalid_settings_surface_error() {
        let settings = ReminderSettings {
            active_window_end: "25:99".into(),
            ..Default::default()
        };
        assert!(should_fire(&settings, Some(at(7, 0)), at(9, 0)).is_err());
    }

    #[test]
    fn silent_mode_presents_popup_only() {
        let settings = ReminderSettings {
            silent_mode: true,
            ..Default::default()
        };
        let p = presentation(&settings, UrgencyLevel::Urgent);
        assert_eq!(p.urgency_level, UrgencyLevel::Urgent);
        assert!(!p.play_sound);
        assert!(p.vibration_pattern.is_none());
    }

    #[test]
    fn vibration_follows_urgency_profile() {
        let settings = ReminderSettings::default();
        let gentle = presentation(&settings, UrgencyLevel::Gentle);
        let urgent = presentation(&settings, UrgencyLevel::Urgent);
        assert!(gentle.play_sound);
        assert_eq!(gentle.vibration_pattern.as_deref(), Some(&[200, 100, 200][..]));
        assert!(urgent.vibration_pattern.unwrap().len() > 3);
    }

    #[test]
    fn last_action_round_trip() {
        let store = MemoryStore::new();
        assert!(load_last_action(&store).unwrap().is_none());
        store_last_action(&store, at(7, 0)).unwrap();
        assert_eq!(load_last_action(&store).unwrap(), Some(at(7, 0)));
    }
}
