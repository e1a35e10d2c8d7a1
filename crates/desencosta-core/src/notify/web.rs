use std::sync::Arc;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{NotificationPort, PermissionState, Platform, ScheduledNotificationRecord};
use crate::error::ReminderError;

/// The page's Notification API.
pub trait BrowserBridge: Send + Sync {
    /// Whether the environment exposes notifications at all.
    fn supported(&self) -> bool;

    fn permission(&self) -> PermissionState;

    fn request_permission(&self) -> PermissionState;

    fn show(&self, title: &str, body: &str);
}

/// Best-effort reminders while the page is open.
///
/// Only the nearest upcoming record gets a live timer. The remainder are
/// kept so the UI can list today's slots, but nothing will deliver them.
pub struct WebTimerNotifier {
    bridge: Arc<dyn BrowserBridge>,
    runtime: Handle,
    timer: Option<JoinHandle<()>>,
    armed: Option<i32>,
    stored: Vec<ScheduledNotificationRecord>,
}

impl WebTimerNotifier {
    pub fn new(bridge: Arc<dyn BrowserBridge>, runtime: Handle) -> Self {
        Self {
            bridge,
            runtime,
            timer: None,
            armed: None,
            stored: Vec::new(),
        }
    }

    /// Id of the record that will actually be shown, if any.
    pub fn armed(&self) -> Option<i32> {
        self.armed
            .filter(|_| self.timer.as_ref().is_some_and(|t| !t.is_finished()))
    }

    fn clear_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.armed = None;
    }
}

impl NotificationPort for WebTimerNotifier {
    fn kind(&self) -> Platform {
        Platform::Web
    }

    fn check_permission(&self) -> PermissionState {
        if !self.bridge.supported() {
            return PermissionState::Denied;
        }
        self.bridge.permission()
    }

    fn request_permission(&mut self) -> bool {
        if !self.bridge.supported() {
            warn!("browser does not support notifications");
            return false;
        }
        if self.bridge.permission() == PermissionState::Granted {
            return true;
        }
        let granted = self.bridge.request_permission() == PermissionState::Granted;
        if !granted {
            warn!("browser notification permission denied");
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
        self.clear_timer();

        let mut sorted = records.to_vec();
        sorted.sort_by_key(|r| r.trigger_at);

        let now = Utc::now();
        if let Some(next) = sorted.iter().find(|r| r.trigger_at > now) {
            let delay = (next.trigger_at - now).to_std().unwrap_or_default();
            let bridge = Arc::clone(&self.bridge);
            let (title, body) = (next.title.clone(), next.body.clone());
            self.timer = Some(self.runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                bridge.show(&title, &body);
            }));
            self.armed = Some(next.id);
            info!(
                id = next.id,
                at = %next.trigger_at,
                stored = sorted.len(),
                "web reminder timer armed"
            );
        } else {
            debug!("no upcoming web reminder to arm");
        }

        self.stored = sorted;
        Ok(())
    }

    fn cancel_all(&mut self) {
        self.clear_timer();
        self.stored.clear();
        debug!("web reminder timer cleared");
    }

    fn pending(&self) -> Vec<ScheduledNotificationRecord> {
        self.stored.clone()
    }
}

impl Drop for WebTimerNotifier {
    fn drop(&mut self) {
        self.clear_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::FakeBrowser;
    use chrono::Duration;

    fn record(id: i32, minutes_ahead: i64) -> ScheduledNotificationRecord {
        ScheduledNotificationRecord {
            id,
            trigger_at: Utc::now() + Duration::minutes(minutes_ahead),
            title: format!("title {id}"),
            body: format!("body {id}"),
            sound: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn only_nearest_record_is_delivered() {
        let bridge = Arc::new(FakeBrowser::granted());
        let mut notifier = WebTimerNotifier::new(bridge.clone(), Handle::current());

        notifier
            .schedule_many(&[record(1002, 30), record(1001, 10), record(1003, 50)])
            .unwrap();
        assert_eq!(notifier.armed(), Some(1001));
        assert_eq!(notifier.pending().len(), 3);
        assert_eq!(notifier.pending()[0].id, 1001);

        tokio::time::sleep(std::time::Duration::from_secs(60 * 60)).await;
        assert_eq!(
            bridge.shown(),
            vec![("title 1001".to_string(), "body 1001".to_string())]
        );
        assert_eq!(notifier.armed(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_aborts_timer() {
        let bridge = Arc::new(FakeBrowser::granted());
        let mut notifier = WebTimerNotifier::new(bridge.clone(), Handle::current());
        notifier.schedule_many(&[record(1001, 5)]).unwrap();
        notifier.cancel_all();

        tokio::time::sleep(std::time::Duration::from_secs(10 * 60)).await;
        assert!(bridge.shown().is_empty());
        assert!(notifier.pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_previous_timer() {
        let bridge = Arc::new(FakeBrowser::granted());
        let mut notifier = WebTimerNotifier::new(bridge.clone(), Handle::current());
        notifier.schedule_many(&[record(1001, 5)]).unwrap();
        notifier.schedule_many(&[record(1001, 20)]).unwrap();

        tokio::time::sleep(std::time::Duration::from_secs(10 * 60)).await;
        assert!(bridge.shown().is_empty());
        tokio::time::sleep(std::time::Duration::from_secs(15 * 60)).await;
        assert_eq!(bridge.shown().len(), 1);
    }

    #[tokio::test]
    async fn unsupported_browser_is_denied() {
        let bridge = Arc::new(FakeBrowser {
            unsupported: true,
            ..FakeBrowser::granted()
        });
        let mut notifier = WebTimerNotifier::new(bridge.clone(), Handle::current());
        assert_eq!(notifier.check_permission(), PermissionState::Denied);
        assert!(!notifier.request_permission());
        assert_eq!(
            notifier.schedule_many(&[record(1001, 5)]),
            Err(ReminderError::PermissionDenied)
        );
    }
}
