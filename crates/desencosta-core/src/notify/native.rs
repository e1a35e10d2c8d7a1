use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    reserved_ids, BridgeError, NotificationPort, PermissionState, Platform,
    ScheduledNotificationRecord,
};
use crate::error::ReminderError;

/// Notification as submitted to the OS scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeNotification {
    pub id: i32,
    pub trigger_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
    pub channel_id: String,
    /// Play the platform default sound.
    pub sound: bool,
}

/// Android-style delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub description: String,
    /// 1 (min) ..= 5 (high)
    pub importance: u8,
    pub vibration: bool,
    pub sound: bool,
}

impl NotificationChannel {
    pub fn alerts(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: "Desencosta Alerts".into(),
            description: "Reminders to relax your jaw".into(),
            importance: 5,
            vibration: true,
            sound: true,
        }
    }
}

/// The host's OS notification scheduler.
pub trait NativeBridge: Send + Sync {
    fn permission(&self) -> PermissionState;

    fn request_permission(&self) -> PermissionState;

    fn create_channel(&self, channel: &NotificationChannel) -> Result<(), BridgeError>;

    /// Submit the whole batch in one call.
    fn schedule(&self, batch: &[NativeNotification]) -> Result<(), BridgeError>;

    fn cancel(&self, ids: &[i32]) -> Result<(), BridgeError>;

    fn pending(&self) -> Result<Vec<NativeNotification>, BridgeError>;
}

/// OS-scheduled reminders; they keep firing after the app exits.
pub struct NativeNotifier {
    bridge: Arc<dyn NativeBridge>,
    channel: NotificationChannel,
    channel_ready: bool,
}

impl NativeNotifier {
    pub fn new(bridge: Arc<dyn NativeBridge>) -> Self {
        Self::with_channel(bridge, NotificationChannel::alerts("alerts"))
    }

    pub fn with_channel(bridge: Arc<dyn NativeBridge>, channel: NotificationChannel) -> Self {
        Self {
            bridge,
            channel,
            channel_ready: false,
        }
    }

    fn ensure_channel(&mut self) {
        if self.channel_ready {
            return;
        }
        match self.bridge.create_channel(&self.channel) {
            Ok(()) => self.channel_ready = true,
            // Delivery still works on the platform default channel.
            Err(e) => warn!(channel = %self.channel.id, error = %e, "failed to create notification channel"),
        }
    }
}

impl NotificationPort for NativeNotifier {
    fn kind(&self) -> Platform {
        Platform::Native
    }

    fn check_permission(&self) -> PermissionState {
        self.bridge.permission()
    }

    fn request_permission(&mut self) -> bool {
        if self.bridge.permission() == PermissionState::Granted {
            return true;
        }
        let granted = self.bridge.request_permission() == PermissionState::Granted;
        if !granted {
            warn!("native notification permission denied");
        }
        granted
    }

    fn schedule_many(
        &mut self,
        records: &[ScheduledNotificationRecord],
    ) -> Result<(), ReminderError> {
        if self.check_permission() != PermissionState::Granted {
            return Err(ReminderError::PermissionDenied);
        }
        let reserved = reserved_ids();
        if let Some(stray) = records.iter().find(|r| !reserved.contains(&r.id)) {
            return Err(ReminderError::SchedulingBackendFailure(format!(
                "notification id {} outside reserved range {}..={}",
                stray.id,
                reserved.start(),
                reserved.end()
            )));
        }

        self.ensure_channel();

        let batch: Vec<NativeNotification> = records
            .iter()
            .map(|r| NativeNotification {
                id: r.id,
                trigger_at: r.trigger_at,
                title: r.title.clone(),
                body: r.body.clone(),
                channel_id: self.channel.id.clone(),
                sound: r.sound,
            })
            .collect();

        self.bridge
            .schedule(&batch)
            .map_err(|e| ReminderError::SchedulingBackendFailure(e.to_string()))?;
        info!(count = batch.len(), "native notifications scheduled");
        Ok(())
    }

    fn cancel_all(&mut self) {
        let ids: Vec<i32> = reserved_ids().collect();
        match self.bridge.cancel(&ids) {
            Ok(()) => debug!("native reminder range cancelled"),
            Err(e) => warn!(error = %e, "failed to cancel native notifications"),
        }
    }

    fn pending(&self) -> Vec<ScheduledNotificationRecord> {
        let reserved = reserved_ids();
        match self.bridge.pending() {
            Ok(list) => {
                let mut records: Vec<ScheduledNotificationRecord> = list
                    .into_iter()
                    .filter(|n| reserved.contains(&n.id))
                    .map(|n| ScheduledNotificationRecord {
                        id: n.id,
                        trigger_at: n.trigger_at,
                        title: n.title,
                        body: n.body,
                        sound: n.sound,
                    })
                    .collect();
                records.sort_by_key(|r| r.trigger_at);
                records
            }
            Err(e) => {
                warn!(error = %e, "failed to list pending native notifications");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::FakeNative;
    use chrono::Duration;

    fn records(n: i32) -> Vec<ScheduledNotificationRecord> {
        let base = Utc::now() + Duration::hours(1);
        (0..n)
            .map(|i| ScheduledNotificationRecord {
                id: 1001 + i,
                trigger_at: base + Duration::minutes(i64::from(i) * 30),
                title: format!("t{i}"),
                body: "b".into(),
                sound: i % 2 == 0,
            })
            .collect()
    }

    #[test]
    fn schedules_whole_batch_in_one_call() {
        let bridge = Arc::new(FakeNative::granted());
        let mut notifier = NativeNotifier::new(bridge.clone());
        notifier.schedule_many(&records(4)).unwrap();

        assert_eq!(bridge.schedule_calls(), 1);
        assert_eq!(bridge.ids(), vec![1001, 1002, 1003, 1004]);
        assert_eq!(bridge.channels.lock().unwrap().as_slice(), ["alerts"]);
        assert_eq!(notifier.pending().len(), 4);
        assert!(notifier.pending()[0].sound);
        assert!(!notifier.pending()[1].sound);
    }

    #[test]
    fn channel_created_once() {
        let bridge = Arc::new(FakeNative::granted());
        let mut notifier = NativeNotifier::new(bridge.clone());
        notifier.schedule_many(&records(1)).unwrap();
        notifier.cancel_all();
        notifier.schedule_many(&records(1)).unwrap();
        assert_eq!(bridge.channels.lock().unwrap().len(), 1);
    }

    #[test]
    fn denied_permission_never_reaches_bridge() {
        let bridge = Arc::new(FakeNative::with_permission(PermissionState::Denied, false));
        let mut notifier = NativeNotifier::new(bridge.clone());
        assert_eq!(
            notifier.schedule_many(&records(2)),
            Err(ReminderError::PermissionDenied)
        );
        assert_eq!(bridge.schedule_calls(), 0);
        assert!(!notifier.request_permission());
    }

    #[test]
    fn request_permission_prompts_when_undetermined() {
        let bridge = Arc::new(FakeNative::with_permission(
            PermissionState::NotDetermined,
            true,
        ));
        let mut notifier = NativeNotifier::new(bridge);
        assert!(notifier.request_permission());
        assert_eq!(notifier.check_permission(), PermissionState::Granted);
        // Idempotent once granted.
        assert!(notifier.request_permission());
    }

    #[test]
    fn cancel_all_covers_reserved_range() {
        let bridge = Arc::new(FakeNative::granted());
        let mut notifier = NativeNotifier::new(bridge.clone());
        notifier.schedule_many(&records(3)).unwrap();
        notifier.cancel_all();
        assert!(notifier.pending().is_empty());
        let cancelled = bridge.cancelled.lock().unwrap();
        assert_eq!(cancelled[0].len(), 20);
    }

    #[test]
    fn backend_failure_is_reported() {
        let bridge = Arc::new(FakeNative {
            fail_schedule: true,
            ..FakeNative::granted()
        });
        let mut notifier = NativeNotifier::new(bridge);
        assert!(matches!(
            notifier.schedule_many(&records(2)),
            Err(ReminderError::SchedulingBackendFailure(_))
        ));
    }

    #[test]
    fn ids_outside_reserved_range_are_rejected() {
        let bridge = Arc::new(FakeNative::granted());
        let mut notifier = NativeNotifier::new(bridge.clone());
        let mut batch = records(1);
        batch[0].id = 42;
        assert!(notifier.schedule_many(&batch).is_err());
        assert_eq!(bridge.schedule_calls(), 0);
    }
}
