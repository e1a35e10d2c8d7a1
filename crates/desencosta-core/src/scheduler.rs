//! Daily reminder schedule.
//!
//! [`ReminderScheduler`] owns the only outstanding schedule. Every change is
//! a full replacement: cancel everything, compute today's instants, attach
//! rotating content, hand the batch to the [`NotificationPort`].
//!
//! ```text
//! Unscheduled --reschedule(ok)--> Scheduled { day, count }
//!      ^                                |
//!      |__ disabled / denied / failure _|
//! ```
//!
//! Reminder errors never escape; they become a [`ScheduleStatus`] the UI can
//! show as a toast.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ReminderError, Result, StorageError};
use crate::messages::message_for;
use crate::notify::{
    NotificationPort, PermissionState, ScheduledNotificationRecord, NOTIFICATION_ID_BASE,
};
use crate::settings::ReminderSettings;
use crate::storage::KeyValueStore;
use crate::window::{compute_trigger_instants, window_day};

/// Display copy of the last applied schedule.
pub const SCHEDULE_KEY: &str = "desencosta_scheduled_notifications";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScheduleState {
    #[default]
    Unscheduled,
    /// `day` is the calendar day the scheduled window opens on.
    Scheduled { day: NaiveDate, count: usize },
}

/// Outcome of a reschedule, meant for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// `count` may be zero when every slot today has already passed.
    Scheduled { day: NaiveDate, count: usize },
    Disabled,
    PermissionDenied,
    /// The previous schedule was left untouched.
    InvalidConfiguration { message: String },
    /// Everything was cancelled.
    BackendFailure { message: String },
}

impl ScheduleStatus {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, ScheduleStatus::Scheduled { .. })
    }
}

pub struct ReminderScheduler {
    port: Box<dyn NotificationPort>,
    store: Arc<dyn KeyValueStore>,
    state: ScheduleState,
    records: Vec<ScheduledNotificationRecord>,
    /// Day of the last reschedule attempt, successful or not.
    attempted: Option<NaiveDate>,
}

impl ReminderScheduler {
    pub fn new(port: Box<dyn NotificationPort>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            port,
            store,
            state: ScheduleState::Unscheduled,
            records: Vec::new(),
            attempted: None,
        }
    }

    pub fn state(&self) -> ScheduleState {
        self.state
    }

    /// Records installed by the last successful reschedule.
    pub fn scheduled_records(&self) -> &[ScheduledNotificationRecord] {
        &self.records
    }

    pub fn permission_state(&self) -> PermissionState {
        self.port.check_permission()
    }

    pub fn port(&self) -> &dyn NotificationPort {
        self.port.as_ref()
    }

    /// Replace the schedule with one derived from `settings` for the window
    /// in progress at `now`, or the next one to open.
    pub fn reschedule<Tz: TimeZone>(
        &mut self,
        settings: &ReminderSettings,
        now: &DateTime<Tz>,
    ) -> ScheduleStatus {
        self.attempted = Some(now.date_naive());

        if !settings.enabled {
            return self.disable();
        }

        let (day, instants) = match settings.validate().and_then(|()| {
            let window = settings.window()?;
            let instants =
                compute_trigger_instants(&window, settings.daily_notification_count, now)?;
            Ok((window_day(&window, now), instants))
        }) {
            Ok(planned) => planned,
            Err(e) => {
                warn!(error = %e, "rejected reminder settings, keeping previous schedule");
                return ScheduleStatus::InvalidConfiguration {
                    message: e.to_string(),
                };
            }
        };

        self.port.cancel_all();

        let granted = match self.port.check_permission() {
            PermissionState::Granted => true,
            PermissionState::NotDetermined => self.port.request_permission(),
            PermissionState::Denied => false,
        };
        if !granted {
            warn!("notification permission not granted, no reminders scheduled");
            self.clear();
            return ScheduleStatus::PermissionDenied;
        }

        // Passed slots are a prefix of the day, so offsetting by their count
        // keeps every slot's id and message stable across reschedules.
        let skipped = settings.daily_notification_count as usize - instants.len();
        let records: Vec<ScheduledNotificationRecord> = instants
            .iter()
            .enumerate()
            .map(|(i, at)| {
                let slot = skipped + i;
                let message = message_for(slot);
                ScheduledNotificationRecord {
                    id: NOTIFICATION_ID_BASE + slot as i32,
                    trigger_at: at.with_timezone(&Utc),
                    title: message.title.to_string(),
                    body: message.body.to_string(),
                    sound: settings.plays_sound(),
                }
            })
            .collect();

        if let Err(e) = self.port.schedule_many(&records) {
            self.port.cancel_all();
            self.clear();
            return match e {
                ReminderError::PermissionDenied => ScheduleStatus::PermissionDenied,
                other => {
                    warn!(error = %other, "notification backend rejected schedule");
                    ScheduleStatus::BackendFailure {
                        message: other.to_string(),
                    }
                }
            };
        }

        if let Err(e) = persist_records(self.store.as_ref(), &records) {
            warn!(error = %e, "failed to store schedule display copy");
        }
        let count = records.len();
        self.records = records;
        self.state = ScheduleState::Scheduled { day, count };
        info!(%day, count, backend = ?self.port.kind(), "reminders scheduled");
        ScheduleStatus::Scheduled { day, count }
    }

    /// Reconcile on app start or resume.
    ///
    /// Reschedules when the scheduled window is no longer the one in progress
    /// or next to open, or when nothing has been attempted yet today. A
    /// window that runs past midnight stays current until it ends. Returns
    /// `None` when the current schedule still stands.
    pub fn on_foreground<Tz: TimeZone>(
        &mut self,
        settings: &ReminderSettings,
        now: &DateTime<Tz>,
    ) -> Option<ScheduleStatus> {
        let stale = match self.state {
            ScheduleState::Scheduled { day, .. } => {
                !settings.enabled
                    || settings
                        .window()
                        .is_ok_and(|window| window_day(&window, now) != day)
            }
            ScheduleState::Unscheduled => self.attempted != Some(now.date_naive()),
        };
        if !stale {
            return None;
        }
        debug!(state = ?self.state, "reconciling reminder schedule");
        Some(self.reschedule(settings, now))
    }

    /// Cancel everything and forget the schedule.
    pub fn disable(&mut self) -> ScheduleStatus {
        self.port.cancel_all();
        self.clear();
        info!("reminders disabled");
        ScheduleStatus::Disabled
    }

    fn clear(&mut self) {
        self.records.clear();
        self.state = ScheduleState::Unscheduled;
        if let Err(e) = self.store.remove(SCHEDULE_KEY) {
            warn!(error = %e, "failed to clear schedule display copy");
        }
    }
}

fn persist_records(
    store: &dyn KeyValueStore,
    records: &[ScheduledNotificationRecord],
) -> Result<(), StorageError> {
    let json = serde_json::to_string(records).map_err(|e| StorageError::Malformed {
        key: SCHEDULE_KEY.to_string(),
        message: e.to_string(),
    })?;
    store.set(SCHEDULE_KEY, &json)
}

/// The last applied schedule as stored for display.
pub fn load_scheduled(store: &dyn KeyValueStore) -> Result<Vec<ScheduledNotificationRecord>> {
    let Some(json) = store.get(SCHEDULE_KEY)? else {
        return Ok(Vec::new());
    };
    serde_json::from_str(&json).map_err(|e| {
        StorageError::Malformed {
            key: SCHEDULE_KEY.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}
