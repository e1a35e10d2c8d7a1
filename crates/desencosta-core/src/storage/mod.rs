mod config;
pub mod database;
mod memory;

pub use config::{BackendChoice, Config, NotificationsConfig, RemindersConfig};
pub use database::{Database, RelaxationEntry, RelaxationKind};
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::error::{ConfigError, StorageError};

/// String-keyed store holding JSON-encoded records.
///
/// Every write replaces the whole value for its key.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Returns the data directory, creating it when missing.
///
/// `DESENCOSTA_DATA_DIR` wins when set. Otherwise `~/.config/desencosta[-dev]/`
/// based on `DESENCOSTA_ENV`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("DESENCOSTA_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env =
                std::env::var("DESENCOSTA_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("desencosta-dev")
            } else {
                base_dir.join("desencosta")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
