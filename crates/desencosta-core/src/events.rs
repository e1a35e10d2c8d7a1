use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::urgency::UrgencyLevel;

/// Every reminder state change produces an Event.
/// Front ends render them; the CLI prints them as JSON lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The foreground check decided a reminder is due.
    ReminderFired {
        urgency_level: UrgencyLevel,
        title: String,
        message: String,
        play_sound: bool,
        vibration_pattern: Option<Vec<u64>>,
        at: DateTime<Utc>,
    },
    /// Prompt closed without exercising.
    ReminderDismissed {
        urgency_level: UrgencyLevel,
        at: DateTime<Utc>,
    },
    ExerciseStarted {
        at: DateTime<Utc>,
    },
    /// Relaxation logged from the home screen, outside any prompt.
    RelaxationLogged {
        at: DateTime<Utc>,
    },
    UrgencyReset {
        at: DateTime<Utc>,
    },
    /// A spooled reminder reached its trigger time.
    NotificationDelivered {
        id: i32,
        title: String,
        body: String,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_by_type() {
        let at = DateTime::parse_from_rfc3339("2024-03-12T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let json = serde_json::to_value(Event::ReminderDismissed {
            urgency_level: UrgencyLevel::Urgent,
            at,
        })
        .unwrap();
        assert_eq!(json["type"], "ReminderDismissed");
        assert_eq!(json["urgency_level"], 2);
    }
}
