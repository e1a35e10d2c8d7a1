use chrono::Utc;
use clap::Subcommand;
use serde_json::json;

use desencosta_core::scheduler::load_scheduled;
use desencosta_core::trigger::reminder_interval;
use desencosta_core::RelaxationKind;

use super::context::{print_json, start_of_today, Context};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Run one foreground check and print the reminder if one is due
    Check,
    /// Dismiss the current reminder without exercising
    Dismiss,
    /// Start the relaxation exercise from a reminder
    Exercise,
    /// Log a relaxation done on your own
    Relax,
    /// Print urgency, timing and today's relaxation count
    Status,
}

pub fn run(action: ReminderAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;
    let mut controller = ctx.controller();
    let now = Utc::now();

    match action {
        ReminderAction::Check => {
            let settings = ctx.settings()?;
            match controller.observe(&settings, now)? {
                Some(event) => print_json(&event)?,
                None => print_json(&json!({ "type": "NothingDue", "at": now }))?,
            }
        }
        ReminderAction::Dismiss => {
            let event = controller.dismiss(now)?;
            print_json(&event)?;
        }
        ReminderAction::Exercise => {
            let event = controller.start_exercise(now)?;
            ctx.db.record_relaxation(RelaxationKind::Reminder, now)?;
            print_json(&event)?;
        }
        ReminderAction::Relax => {
            let event = controller.log_relaxation(now)?;
            ctx.db.record_relaxation(RelaxationKind::Manual, now)?;
            print_json(&event)?;
        }
        ReminderAction::Status => {
            let settings = ctx.settings()?;
            let last_action = controller.last_action()?;
            let next_due = match (settings.enabled, last_action) {
                (true, Some(last)) => Some(last + reminder_interval(&settings)?),
                _ => None,
            };
            let today = ctx.db.relaxations_since(start_of_today())?;
            print_json(&json!({
                "enabled": settings.enabled,
                "urgency_level": controller.urgency()?,
                "last_action": last_action,
                "next_due": next_due,
                "relaxations_today": today.len(),
                "scheduled_today": load_scheduled(ctx.db.as_ref())?.len(),
                "notifications_permitted": ctx.config.notifications.enabled,
            }))?;
        }
    }
    Ok(())
}
