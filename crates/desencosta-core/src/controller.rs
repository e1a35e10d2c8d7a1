//! Foreground reminder flow.
//!
//! The poller calls [`ReminderController::observe`] on every tick. When a
//! reminder fires the prompt stays open until the user either dismisses it
//! (urgency escalates) or starts an exercise (urgency resets). Both responses
//! restart the interval from the moment they happen.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::Result;
use crate::events::Event;
use crate::haptics::HapticPort;
use crate::messages::profile;
use crate::settings::ReminderSettings;
use crate::storage::KeyValueStore;
use crate::trigger::{load_last_action, presentation, should_fire, store_last_action};
use crate::urgency::{UrgencyLevel, UrgencyTracker};

pub struct ReminderController {
    store: Arc<dyn KeyValueStore>,
    urgency: UrgencyTracker,
    haptics: Box<dyn HapticPort>,
    prompt_open: bool,
}

impl ReminderController {
    pub fn new(store: Arc<dyn KeyValueStore>, haptics: Box<dyn HapticPort>) -> Self {
        Self {
            urgency: UrgencyTracker::new(Arc::clone(&store)),
            store,
            haptics,
            prompt_open: false,
        }
    }

    pub fn prompt_open(&self) -> bool {
        self.prompt_open
    }

    pub fn urgency(&self) -> Result<UrgencyLevel> {
        self.urgency.current()
    }

    pub fn last_action(&self) -> Result<Option<DateTime<Utc>>> {
        load_last_action(self.store.as_ref())
    }

    /// One poll tick. Returns the event to present when a reminder fires.
    pub fn observe(
        &mut self,
        settings: &ReminderSettings,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>> {
        if self.prompt_open {
            return Ok(None);
        }
        let last = load_last_action(self.store.as_ref())?;
        if last.is_none() {
            // First run: start counting from now.
            store_last_action(self.store.as_ref(), now)?;
            debug!(%now, "reminder baseline initialised");
            return Ok(None);
        }
        if !should_fire(settings, last, now)? {
            return Ok(None);
        }

        store_last_action(self.store.as_ref(), now)?;
        let level = self.urgency.current()?;
        let shown = presentation(settings, level);
        if let Some(pattern) = &shown.vibration_pattern {
            if !self.haptics.vibrate(pattern) {
                debug!("vibration unavailable");
            }
        }
        self.prompt_open = true;

        let tone = profile(level);
        info!(level = level.as_u8(), sound = shown.play_sound, "reminder fired");
        Ok(Some(Event::ReminderFired {
            urgency_level: level,
            title: tone.title.to_string(),
            message: tone.message.to_string(),
            play_sound: shown.play_sound,
            vibration_pattern: shown.vibration_pattern,
            at: now,
        }))
    }

    /// Prompt closed without exercising.
    pub fn dismiss(&mut self, now: DateTime<Utc>) -> Result<Event> {
        self.close_prompt();
        let level = self.urgency.on_dismiss()?;
        store_last_action(self.store.as_ref(), now)?;
        info!(level = level.as_u8(), "reminder dismissed");
        Ok(Event::ReminderDismissed {
            urgency_level: level,
            at: now,
        })
    }

    /// Back navigation: closes an open prompt like a dismissal and does
    /// nothing otherwise.
    pub fn back(&mut self, now: DateTime<Utc>) -> Result<Option<Event>> {
        if !self.prompt_open {
            debug!("back pressed with no reminder open");
            return Ok(None);
        }
        self.dismiss(now).map(Some)
    }

    /// Exercise started from the prompt.
    pub fn start_exercise(&mut self, now: DateTime<Utc>) -> Result<Event> {
        self.close_prompt();
        self.urgency.on_engage()?;
        store_last_action(self.store.as_ref(), now)?;
        info!("exercise started");
        Ok(Event::ExerciseStarted { at: now })
    }

    /// Relaxation logged outside any prompt. Counts as engagement.
    pub fn log_relaxation(&mut self, now: DateTime<Utc>) -> Result<Event> {
        self.urgency.on_engage()?;
        store_last_action(self.store.as_ref(), now)?;
        info!("relaxation logged");
        Ok(Event::RelaxationLogged { at: now })
    }

    /// Turning reminders back on starts again from a gentle tone.
    pub fn settings_changed(
        &mut self,
        old: &ReminderSettings,
        new: &ReminderSettings,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>> {
        if !new.enabled && self.prompt_open {
            self.close_prompt();
        }
        if old.enabled || !new.enabled {
            return Ok(None);
        }
        self.urgency.on_engage()?;
        info!("reminders re-enabled, urgency reset");
        Ok(Some(Event::UrgencyReset { at: now }))
    }

    fn close_prompt(&mut self) {
        if !self.prompt_open {
            debug!("no reminder prompt open");
        }
        self.prompt_open = false;
        self.haptics.stop();
    }
}
