use chrono::Local;
use clap::Subcommand;
use serde_json::json;
use tokio::runtime::Handle;

use desencosta_core::scheduler::load_scheduled;

use super::context::{print_json, Context};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Compute and install today's reminders
    Apply,
    /// Show today's slots and the installed reminders
    Show,
    /// Cancel today's reminders
    Clear,
}

pub fn run(action: ScheduleAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;
    match action {
        ScheduleAction::Apply => {
            let settings = ctx.settings()?;
            let mut scheduler = ctx.scheduler(Handle::current())?;
            let status = scheduler.reschedule(&settings, &Local::now());
            print_json(&status)?;
        }
        ScheduleAction::Show => {
            let settings = ctx.settings()?;
            let slots: Vec<String> = settings
                .window()?
                .slot_times(settings.daily_notification_count)?
                .iter()
                .map(|t| t.format("%H:%M").to_string())
                .collect();
            let installed = load_scheduled(ctx.db.as_ref())?;
            print_json(&json!({
                "enabled": settings.enabled,
                "slots": slots,
                "installed": installed,
            }))?;
        }
        ScheduleAction::Clear => {
            let mut scheduler = ctx.scheduler(Handle::current())?;
            let status = scheduler.disable();
            print_json(&status)?;
        }
    }
    Ok(())
}
