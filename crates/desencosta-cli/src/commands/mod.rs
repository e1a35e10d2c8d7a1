pub mod config;
pub mod context;
pub mod reminder;
pub mod schedule;
pub mod settings;
pub mod watch;
