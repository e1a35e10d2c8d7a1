//! # Desencosta Core Library
//!
//! Reminder engine for the Desencosta jaw-relaxation app. Every operation is
//! available through the standalone `desencosta` CLI; graphical front ends
//! are thin layers over the same library.
//!
//! ## Architecture
//!
//! - **Window math**: spreads a daily notification count over the user's
//!   active window
//! - **Urgency**: escalates reminder tone while prompts are dismissed without
//!   exercising
//! - **Notifications**: one port, a native backend (OS scheduler) and a web
//!   backend (single in-page timer)
//! - **Storage**: key-value records, SQLite persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`ReminderScheduler`]: installs today's platform notifications
//! - [`ReminderController`]: foreground reminder prompts
//! - [`NotificationPort`]: platform notification backends
//! - [`Database`]: key-value store, relaxation log and desktop spool
//! - [`Config`]: application configuration management

pub mod controller;
pub mod error;
pub mod events;
pub mod haptics;
pub mod messages;
pub mod modal;
pub mod notify;
pub mod poller;
pub mod scheduler;
pub mod settings;
pub mod storage;
pub mod trigger;
pub mod urgency;
pub mod window;

pub use controller::ReminderController;
pub use error::{ConfigError, CoreError, ReminderError, StorageError};
pub use events::Event;
pub use haptics::{HapticPort, NoHaptics};
pub use modal::{ModalRegistry, ModalToken};
pub use notify::{
    select_backend, DesktopSpool, HostBridges, NotificationPort, PermissionState, Platform,
    ScheduledNotificationRecord,
};
pub use poller::ForegroundPoller;
pub use scheduler::{ReminderScheduler, ScheduleState, ScheduleStatus};
pub use settings::ReminderSettings;
pub use storage::{Config, Database, KeyValueStore, MemoryStore, RelaxationKind};
pub use trigger::{should_fire, Presentation};
pub use urgency::{UrgencyLevel, UrgencyTracker};
pub use window::{compute_average_interval, compute_trigger_instants, window_day, ActiveWindow};
