//! Platform notification backends.
//!
//! One [`NotificationPort`] trait, two implementations:
//!
//! - [`NativeNotifier`]: hands the whole day to the OS scheduler, which
//!   delivers across app restarts.
//! - [`WebTimerNotifier`]: keeps a single in-process timer for the nearest
//!   reminder; the rest are informational and die with the page.
//!
//! The backend is picked once at startup by [`select_backend`]; call sites
//! only ever see the trait.

mod native;
mod spool;
mod web;

pub use native::{NativeBridge, NativeNotification, NativeNotifier, NotificationChannel};
pub use spool::DesktopSpool;
pub use web::{BrowserBridge, WebTimerNotifier};

use std::ops::RangeInclusive;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::Handle;

use crate::error::{ReminderError, StorageError};
use crate::window::MAX_DAILY_NOTIFICATIONS;

/// First id of the range reserved for daily reminders.
pub const NOTIFICATION_ID_BASE: i32 = 1001;

/// Ids owned by this subsystem (`1001..=1020`).
pub fn reserved_ids() -> RangeInclusive<i32> {
    NOTIFICATION_ID_BASE..=NOTIFICATION_ID_BASE + MAX_DAILY_NOTIFICATIONS as i32 - 1
}

/// Runtime flavour the host application is running under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Native,
    Web,
}

impl Platform {
    pub fn detect() -> Self {
        if cfg!(target_arch = "wasm32") {
            Platform::Web
        } else {
            Platform::Native
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    Granted,
    Denied,
    NotDetermined,
}

/// One reminder slot for today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledNotificationRecord {
    pub id: i32,
    pub trigger_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub sound: bool,
}

/// Failure reported by a host bridge.
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct BridgeError(pub String);

impl From<StorageError> for BridgeError {
    fn from(err: StorageError) -> Self {
        BridgeError(err.to_string())
    }
}

/// Schedule and cancel reminders on the host platform.
///
/// Rescheduling is always `cancel_all` followed by `schedule_many`; no
/// implementation patches an existing schedule.
pub trait NotificationPort: Send {
    fn kind(&self) -> Platform;

    fn check_permission(&self) -> PermissionState;

    /// Ask the user; returns whether permission is now granted.
    fn request_permission(&mut self) -> bool;

    /// Install `records`.
    ///
    /// # Errors
    /// `PermissionDenied` without touching the platform when permission is
    /// not granted; `SchedulingBackendFailure` when the platform rejects the
    /// batch.
    fn schedule_many(&mut self, records: &[ScheduledNotificationRecord])
        -> Result<(), ReminderError>;

    /// Drop every reminder this subsystem owns. Failures are logged only.
    fn cancel_all(&mut self);

    /// Reminders the backend currently holds, earliest first.
    fn pending(&self) -> Vec<ScheduledNotificationRecord>;
}

/// Bridges the embedding application can offer.
#[derive(Default, Clone)]
pub struct HostBridges {
    pub native: Option<Arc<dyn NativeBridge>>,
    pub browser: Option<Arc<dyn BrowserBridge>>,
    /// Native delivery channel; `alerts` when unset.
    pub channel_id: Option<String>,
}

/// Build the backend for `platform`, falling back to whichever bridge exists.
///
/// # Errors
/// `SchedulingBackendFailure` when the host offers no bridge at all.
pub fn select_backend(
    platform: Platform,
    bridges: HostBridges,
    runtime: Handle,
) -> Result<Box<dyn NotificationPort>, ReminderError> {
    let HostBridges {
        native,
        browser,
        channel_id,
    } = bridges;
    let port: Box<dyn NotificationPort> = match (platform, native, browser) {
        (Platform::Native, Some(native), _) | (Platform::Web, Some(native), None) => {
            let channel = NotificationChannel::alerts(channel_id.as_deref().unwrap_or("alerts"));
            Box::new(NativeNotifier::with_channel(native, channel))
        }
        (_, _, Some(browser)) => Box::new(WebTimerNotifier::new(browser, runtime)),
        (_, None, None) => {
            return Err(ReminderError::SchedulingBackendFailure(
                "host offers no notification bridge".into(),
            ))
        }
    };
    if port.kind() != platform {
        tracing::warn!(
            requested = ?platform,
            actual = ?port.kind(),
            "notification bridge for requested platform missing, falling back"
        );
    }
    Ok(port)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scriptable bridges shared by the backend and scheduler tests.

    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct FakeNative {
        pub permission: Mutex<Option<PermissionState>>,
        pub grant_on_request: bool,
        pub fail_schedule: bool,
        pub scheduled: Mutex<Vec<NativeNotification>>,
        pub schedule_calls: Mutex<usize>,
        pub cancelled: Mutex<Vec<Vec<i32>>>,
        pub channels: Mutex<Vec<String>>,
    }

    impl FakeNative {
        pub fn granted() -> Self {
            Self {
                permission: Mutex::new(Some(PermissionState::Granted)),
                ..Default::default()
            }
        }

        pub fn with_permission(state: PermissionState, grant_on_request: bool) -> Self {
            Self {
                permission: Mutex::new(Some(state)),
                grant_on_request,
                ..Default::default()
            }
        }

        pub fn schedule_calls(&self) -> usize {
            *self.schedule_calls.lock().unwrap()
        }

        pub fn ids(&self) -> Vec<i32> {
            self.scheduled.lock().unwrap().iter().map(|n| n.id).collect()
        }
    }

    impl NativeBridge for FakeNative {
        fn permission(&self) -> PermissionState {
            self.permission
                .lock()
                .unwrap()
                .unwrap_or(PermissionState::NotDetermined)
        }

        fn request_permission(&self) -> PermissionState {
            let mut permission = self.permission.lock().unwrap();
            let next = if self.grant_on_request {
                PermissionState::Granted
            } else {
                PermissionState::Denied
            };
            *permission = Some(next);
            next
        }

        fn create_channel(&self, channel: &NotificationChannel) -> Result<(), BridgeError> {
            self.channels.lock().unwrap().push(channel.id.clone());
            Ok(())
        }

        fn schedule(&self, batch: &[NativeNotification]) -> Result<(), BridgeError> {
            *self.schedule_calls.lock().unwrap() += 1;
            if self.fail_schedule {
                return Err(BridgeError("quota exceeded".into()));
            }
            self.scheduled.lock().unwrap().extend_from_slice(batch);
            Ok(())
        }

        fn cancel(&self, ids: &[i32]) -> Result<(), BridgeError> {
            self.cancelled.lock().unwrap().push(ids.to_vec());
            self.scheduled
                .lock()
                .unwrap()
                .retain(|n| !ids.contains(&n.id));
            Ok(())
        }

        fn pending(&self) -> Result<Vec<NativeNotification>, BridgeError> {
            Ok(self.scheduled.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    pub struct FakeBrowser {
        pub unsupported: bool,
        pub permission: Mutex<Option<PermissionState>>,
        pub shown: Mutex<Vec<(String, String)>>,
    }

    impl FakeBrowser {
        pub fn granted() -> Self {
            Self {
                permission: Mutex::new(Some(PermissionState::Granted)),
                ..Default::default()
            }
        }

        pub fn shown(&self) -> Vec<(String, String)> {
            self.shown.lock().unwrap().clone()
        }
    }

    impl BrowserBridge for FakeBrowser {
        fn supported(&self) -> bool {
            !self.unsupported
        }

        fn permission(&self) -> PermissionState {
            self.permission
                .lock()
                .unwrap()
                .unwrap_or(PermissionState::NotDetermined)
        }

        fn request_permission(&self) -> PermissionState {
            let mut permission = self.permission.lock().unwrap();
            let next = permission.unwrap_or(PermissionState::Denied);
            *permission = Some(next);
            next
        }

        fn show(&self, title: &str, body: &str) {
            self.shown
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FakeBrowser, FakeNative};
    use super::*;

    #[test]
    fn reserved_range_has_twenty_ids() {
        let ids = reserved_ids();
        assert_eq!(*ids.start(), 1001);
        assert_eq!(*ids.end(), 1020);
        assert_eq!(ids.count(), MAX_DAILY_NOTIFICATIONS);
    }

    #[tokio::test]
    async fn select_backend_prefers_platform_bridge() {
        let bridges = HostBridges {
            native: Some(Arc::new(FakeNative::granted())),
            browser: Some(Arc::new(FakeBrowser::granted())),
            channel_id: None,
        };
        let native = select_backend(Platform::Native, bridges.clone(), Handle::current()).unwrap();
        assert_eq!(native.kind(), Platform::Native);
        let web = select_backend(Platform::Web, bridges, Handle::current()).unwrap();
        assert_eq!(web.kind(), Platform::Web);
    }

    #[tokio::test]
    async fn select_backend_falls_back_to_available_bridge() {
        let only_browser = HostBridges {
            native: None,
            browser: Some(Arc::new(FakeBrowser::granted())),
            channel_id: None,
        };
        let port = select_backend(Platform::Native, only_browser, Handle::current()).unwrap();
        assert_eq!(port.kind(), Platform::Web);

        assert!(select_backend(Platform::Web, HostBridges::default(), Handle::current()).is_err());
    }
}
