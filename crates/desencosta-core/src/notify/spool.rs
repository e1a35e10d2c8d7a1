use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{BridgeError, NativeBridge, NativeNotification, NotificationChannel, PermissionState};
use crate::error::StorageError;
use crate::storage::Database;

/// Desktop stand-in for an OS notification scheduler.
///
/// Reminders are written to the `notification_spool` table and survive
/// restarts like OS-scheduled ones; a foreground process calls
/// [`DesktopSpool::take_due`] to deliver them.
pub struct DesktopSpool {
    db: Arc<Database>,
    permitted: bool,
}

impl DesktopSpool {
    /// `permitted` mirrors `notifications.enabled` from the config.
    pub fn new(db: Arc<Database>, permitted: bool) -> Self {
        Self { db, permitted }
    }

    /// Claim every reminder due at `now`; each is returned once.
    pub fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<NativeNotification>, StorageError> {
        self.db.spool_take_due(now)
    }

    fn state(&self) -> PermissionState {
        if self.permitted {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }
}

impl NativeBridge for DesktopSpool {
    fn permission(&self) -> PermissionState {
        self.state()
    }

    fn request_permission(&self) -> PermissionState {
        // No prompt on desktop: the config flag is the user's answer.
        self.state()
    }

    fn create_channel(&self, channel: &NotificationChannel) -> Result<(), BridgeError> {
        debug!(channel = %channel.id, "desktop spool uses a single channel");
        Ok(())
    }

    fn schedule(&self, batch: &[NativeNotification]) -> Result<(), BridgeError> {
        Ok(self.db.spool_insert(batch)?)
    }

    fn cancel(&self, ids: &[i32]) -> Result<(), BridgeError> {
        self.db.spool_delete(ids)?;
        Ok(())
    }

    fn pending(&self) -> Result<Vec<NativeNotification>, BridgeError> {
        Ok(self.db.spool_pending()?)
    }
}
