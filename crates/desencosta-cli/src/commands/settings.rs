use chrono::{Local, Utc};
use clap::Subcommand;
use serde_json::Value;
use tokio::runtime::Handle;

use desencosta_core::ReminderSettings;

use super::context::{print_json, Context};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print reminder settings as JSON
    Show,
    /// Set a reminder setting
    Set {
        /// Setting name (e.g. "active_window_start", "daily_notification_count")
        key: String,
        /// New value; JSON literals are parsed, anything else is a string
        value: String,
    },
    /// Turn reminders on
    Enable,
    /// Turn reminders off
    Disable,
    /// Restore default settings
    Reset,
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;
    let current = ctx.settings()?;

    let updated = match action {
        SettingsAction::Show => return print_json(&current),
        SettingsAction::Set { key, value } => with_field(&current, &key, &value)?,
        SettingsAction::Enable => ReminderSettings {
            enabled: true,
            ..current.clone()
        },
        SettingsAction::Disable => ReminderSettings {
            enabled: false,
            ..current.clone()
        },
        SettingsAction::Reset => ReminderSettings::default(),
    };

    // Rejected settings never reach storage.
    updated.validate()?;
    updated.save(ctx.db.as_ref())?;

    let mut controller = ctx.controller();
    if let Some(event) = controller.settings_changed(&current, &updated, Utc::now())? {
        println!("{}", serde_json::to_string(&event)?);
    }
    let mut scheduler = ctx.scheduler(Handle::current())?;
    let status = scheduler.reschedule(&updated, &Local::now());
    print_json(&status)
}

/// Replace one top-level field, going through serde so types are checked.
fn with_field(
    settings: &ReminderSettings,
    key: &str,
    value: &str,
) -> Result<ReminderSettings, Box<dyn std::error::Error>> {
    let mut json = serde_json::to_value(settings)?;
    let fields = json
        .as_object_mut()
        .ok_or("settings did not serialize to an object")?;
    if !fields.contains_key(key) {
        return Err(format!("unknown setting: {key}").into());
    }
    let parsed =
        serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()));
    fields.insert(key.to_string(), parsed);
    serde_json::from_value(json).map_err(|e| format!("invalid value for {key}: {e}").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_parses_numbers_and_times() {
        let base = ReminderSettings::default();
        let s = with_field(&base, "daily_notification_count", "10").unwrap();
        assert_eq!(s.daily_notification_count, 10);
        let s = with_field(&base, "active_window_start", "07:30").unwrap();
        assert_eq!(s.active_window_start, "07:30");
        let s = with_field(&base, "frequency_minutes", "45").unwrap();
        assert_eq!(s.frequency_minutes, Some(45));
        let s = with_field(&s, "frequency_minutes", "null").unwrap();
        assert_eq!(s.frequency_minutes, None);
    }

    #[test]
    fn set_rejects_unknown_or_mistyped() {
        let base = ReminderSettings::default();
        assert!(with_field(&base, "volume", "3").is_err());
        assert!(with_field(&base, "silent_mode", "often").is_err());
    }
}
