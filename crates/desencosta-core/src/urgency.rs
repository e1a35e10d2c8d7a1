//! Reminder urgency escalation.
//!
//! ## Levels
//!
//! - **Gentle (0)**: default tone
//! - **Supportive (1)**: one reminder dismissed without exercising
//! - **Urgent (2)**: two or more dismissed; stays here until the user engages
//!
//! ```text
//! Gentle --dismiss--> Supportive --dismiss--> Urgent --dismiss--> Urgent
//!   ^__________________engage_____________________|
//! ```
//!
//! The level is a single persisted integer; there is no other state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::storage::KeyValueStore;

pub const URGENCY_KEY: &str = "desencosta_urgency_level";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum UrgencyLevel {
    #[default]
    Gentle,
    Supportive,
    Urgent,
}

impl UrgencyLevel {
    /// Numeric level value (0-2)
    pub fn as_u8(self) -> u8 {
        match self {
            UrgencyLevel::Gentle => 0,
            UrgencyLevel::Supportive => 1,
            UrgencyLevel::Urgent => 2,
        }
    }

    /// Anything above 2 clamps to `Urgent`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => UrgencyLevel::Gentle,
            1 => UrgencyLevel::Supportive,
            _ => UrgencyLevel::Urgent,
        }
    }

    /// Next level after a dismissal, saturating at `Urgent`.
    pub fn escalate(self) -> Self {
        Self::from_u8(self.as_u8().saturating_add(1))
    }

    pub fn reset() -> Self {
        UrgencyLevel::Gentle
    }
}

impl From<u8> for UrgencyLevel {
    fn from(value: u8) -> Self {
        Self::from_u8(value)
    }
}

impl From<UrgencyLevel> for u8 {
    fn from(level: UrgencyLevel) -> Self {
        level.as_u8()
    }
}

/// Persisted urgency level.
pub struct UrgencyTracker {
    store: Arc<dyn KeyValueStore>,
}

impl UrgencyTracker {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored level; missing or unreadable values count as `Gentle`.
    pub fn current(&self) -> Result<UrgencyLevel> {
        let raw = match self.store.get(URGENCY_KEY)? {
            Some(raw) => raw,
            None => return Ok(UrgencyLevel::Gentle),
        };
        match raw.trim().parse::<u8>() {
            Ok(value) => Ok(UrgencyLevel::from_u8(value)),
            Err(_) => {
                warn!(value = %raw, "unreadable urgency level, treating as gentle");
                Ok(UrgencyLevel::Gentle)
            }
        }
    }

    /// Record a dismissal without exercising.
    pub fn on_dismiss(&self) -> Result<UrgencyLevel> {
        let next = self.current()?.escalate();
        self.set(next)?;
        Ok(next)
    }

    /// Record that the user started or finished an exercise.
    pub fn on_engage(&self) -> Result<UrgencyLevel> {
        let level = UrgencyLevel::reset();
        self.set(level)?;
        Ok(level)
    }

    fn set(&self, level: UrgencyLevel) -> Result<()> {
        self.store.set(URGENCY_KEY, &level.as_u8().to_string())?;
        debug!(level = level.as_u8(), "urgency level stored");
        Ok(())
    }
}
