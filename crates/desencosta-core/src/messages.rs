//! Static reminder content.
//!
//! Scheduled notifications rotate through [`NOTIFICATION_MESSAGES`] by slot
//! index; in-app prompts take their tone from the [`UrgencyProfile`] of the
//! current level.

use crate::urgency::UrgencyLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationMessage {
    pub title: &'static str,
    pub body: &'static str,
}

pub const NOTIFICATION_MESSAGES: [NotificationMessage; 6] = [
    NotificationMessage {
        title: "Unclench! 👀",
        body: "Hey, are your teeth touching right now?",
    },
    NotificationMessage {
        title: "Unclench! 😌",
        body: "Time to let your jaw go loose",
    },
    NotificationMessage {
        title: "Unclench! 😬➡️😌",
        body: "Breathe in… and unclench",
    },
    NotificationMessage {
        title: "Unclench! 🦷",
        body: "Relax your jaw and part your teeth",
    },
    NotificationMessage {
        title: "Unclench! 💆",
        body: "A moment to ease the tension in your jaw",
    },
    NotificationMessage {
        title: "Unclench! 🧘",
        body: "Pause and relax your jaw",
    },
];

/// Message for slot `index`, cycling through the table.
pub fn message_for(index: usize) -> &'static NotificationMessage {
    &NOTIFICATION_MESSAGES[index % NOTIFICATION_MESSAGES.len()]
}

/// How a prompt looks and feels at a given urgency level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrgencyProfile {
    pub level: UrgencyLevel,
    pub title: &'static str,
    pub message: &'static str,
    /// Vibration on/off durations in milliseconds.
    pub vibration_pattern: &'static [u64],
    /// UI accent token.
    pub accent: &'static str,
}

const PROFILES: [UrgencyProfile; 3] = [
    UrgencyProfile {
        level: UrgencyLevel::Gentle,
        title: "Time to relax",
        message: "Take a moment to release your jaw.",
        vibration_pattern: &[200, 100, 200],
        accent: "primary",
    },
    UrgencyProfile {
        level: UrgencyLevel::Supportive,
        title: "Your jaw needs a break",
        message: "You skipped the last reminder. A short exercise helps.",
        vibration_pattern: &[300, 150, 300, 150, 300],
        accent: "warning",
    },
    UrgencyProfile {
        level: UrgencyLevel::Urgent,
        title: "Stop clenching now",
        message: "Several reminders in a row were skipped. Relax your jaw now.",
        vibration_pattern: &[500, 200, 500, 200, 500, 200, 500],
        accent: "destructive",
    },
];

pub fn profile(level: UrgencyLevel) -> &'static UrgencyProfile {
    &PROFILES[level.as_u8() as usize]
}
