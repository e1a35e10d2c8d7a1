use std::sync::Arc;

use chrono::{DateTime, Duration, Local, Utc};
use serde::Serialize;
use tokio::runtime::Handle;

use desencosta_core::notify::BrowserBridge;
use desencosta_core::{
    select_backend, Config, CoreError, Database, DesktopSpool, HostBridges, NoHaptics,
    PermissionState, ReminderController, ReminderError, ReminderScheduler, ReminderSettings,
};

/// Everything a command needs from the data directory.
pub struct Context {
    pub db: Arc<Database>,
    pub config: Config,
}

impl Context {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let db = Arc::new(Database::open()?);
        Ok(Self { db, config })
    }

    pub fn settings(&self) -> Result<ReminderSettings, CoreError> {
        ReminderSettings::load(self.db.as_ref())
    }

    pub fn spool(&self) -> Arc<DesktopSpool> {
        Arc::new(DesktopSpool::new(
            Arc::clone(&self.db),
            self.config.notifications.enabled,
        ))
    }

    /// Build the scheduler over the configured backend.
    ///
    /// `native` is the database spool; `web` prints notifications to stdout
    /// while this process lives.
    pub fn scheduler(&self, runtime: Handle) -> Result<ReminderScheduler, ReminderError> {
        let bridges = HostBridges {
            native: Some(self.spool()),
            browser: Some(Arc::new(TerminalBridge {
                permitted: self.config.notifications.enabled,
            })),
            channel_id: Some(self.config.notifications.channel_id.clone()),
        };
        let port = select_backend(self.config.reminders.backend.resolve(), bridges, runtime)?;
        Ok(ReminderScheduler::new(port, self.db.clone()))
    }

    pub fn controller(&self) -> ReminderController {
        ReminderController::new(self.db.clone(), Box::new(NoHaptics))
    }
}

/// In-process notifications shown as JSON lines on stdout.
struct TerminalBridge {
    permitted: bool,
}

impl BrowserBridge for TerminalBridge {
    fn supported(&self) -> bool {
        true
    }

    fn permission(&self) -> PermissionState {
        if self.permitted {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }

    fn request_permission(&self) -> PermissionState {
        self.permission()
    }

    fn show(&self, title: &str, body: &str) {
        let line = serde_json::json!({
            "type": "NotificationShown",
            "title": title,
            "body": body,
            "at": Utc::now(),
        });
        println!("{line}");
    }
}

/// Start of the local calendar day, in UTC.
pub fn start_of_today() -> DateTime<Utc> {
    Local::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc::now() - Duration::days(1))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
