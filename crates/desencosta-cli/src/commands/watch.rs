//! Foreground reminder loop.
//!
//! Ticks the controller on the configured cadence, delivers spooled
//! notifications as they fall due and reconciles the day's schedule. Events
//! go to stdout as JSON lines; commands are read from stdin:
//!
//! - `d` dismiss the open reminder
//! - `e` start the exercise
//! - `r` log a relaxation
//! - `b` back: closes the open reminder like a dismissal, ignored otherwise

use std::time::Duration;

use chrono::{Local, Utc};
use clap::Args;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{info, warn};

use desencosta_core::{
    Event, ForegroundPoller, ModalRegistry, ModalToken, RelaxationKind, ReminderController,
    ReminderScheduler, ReminderSettings,
};

use super::context::Context;

#[derive(Args)]
pub struct WatchArgs {
    /// Poll interval in seconds (defaults to reminders.poll_interval_secs)
    #[arg(long)]
    pub every: Option<u64>,
}

struct Session {
    ctx: Context,
    scheduler: ReminderScheduler,
    controller: ReminderController,
    settings: ReminderSettings,
    modals: ModalRegistry,
    prompt: Option<ModalToken>,
    back_tx: mpsc::UnboundedSender<()>,
}

fn emit<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

impl Session {
    fn new(
        ctx: Context,
        back_tx: mpsc::UnboundedSender<()>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let scheduler = ctx.scheduler(Handle::current())?;
        let controller = ctx.controller();
        let settings = ctx.settings()?;
        Ok(Self {
            ctx,
            scheduler,
            controller,
            settings,
            modals: ModalRegistry::new(),
            prompt: None,
            back_tx,
        })
    }

    fn tick(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let latest = self.ctx.settings()?;
        if latest != self.settings {
            let previous = std::mem::replace(&mut self.settings, latest);
            if let Some(event) =
                self.controller
                    .settings_changed(&previous, &self.settings, Utc::now())?
            {
                emit(&event)?;
            }
            self.sync_prompt();
            emit(&self.scheduler.reschedule(&self.settings, &Local::now()))?;
        } else if let Some(status) = self.scheduler.on_foreground(&self.settings, &Local::now()) {
            emit(&status)?;
        }

        let now = Utc::now();
        for n in self.ctx.spool().take_due(now)? {
            emit(&Event::NotificationDelivered {
                id: n.id,
                title: n.title,
                body: n.body,
                at: now,
            })?;
        }

        if let Some(event) = self.controller.observe(&self.settings, now)? {
            emit(&event)?;
            self.open_prompt();
        }
        Ok(())
    }

    fn open_prompt(&mut self) {
        let back = self.back_tx.clone();
        self.prompt = Some(self.modals.register(Box::new(move || {
            let _ = back.send(());
        })));
    }

    fn close_prompt(&mut self) {
        if let Some(token) = self.prompt.take() {
            self.modals.unregister(token);
        }
    }

    /// Drop the back handler once the controller has closed the prompt.
    fn sync_prompt(&mut self) {
        if !self.controller.prompt_open() {
            self.close_prompt();
        }
    }

    fn back(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.close_prompt();
        match self.controller.back(Utc::now())? {
            Some(event) => emit(&event),
            None => Ok(()),
        }
    }

    fn dismiss(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.close_prompt();
        emit(&self.controller.dismiss(Utc::now())?)
    }

    fn exercise(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.close_prompt();
        let now = Utc::now();
        let event = self.controller.start_exercise(now)?;
        self.ctx.db.record_relaxation(RelaxationKind::Reminder, now)?;
        emit(&event)
    }

    fn relax(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let now = Utc::now();
        let event = self.controller.log_relaxation(now)?;
        self.ctx.db.record_relaxation(RelaxationKind::Manual, now)?;
        emit(&event)
    }

    fn handle_input(&mut self, line: &str) -> Result<(), Box<dyn std::error::Error>> {
        match line.trim() {
            "" => Ok(()),
            "d" if self.controller.prompt_open() => self.dismiss(),
            "e" if self.controller.prompt_open() => self.exercise(),
            "d" | "e" => {
                warn!("no reminder open");
                Ok(())
            }
            "r" => self.relax(),
            "b" => {
                // The registered close handler routes into `back`.
                if !self.modals.handle_back() {
                    info!("nothing to close");
                }
                Ok(())
            }
            other => {
                warn!(input = other, "unknown command, expected d, e, r or b");
                Ok(())
            }
        }
    }
}

pub async fn run(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;
    let every = args
        .every
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| ctx.config.poll_interval());
    let (back_tx, mut back_rx) = mpsc::unbounded_channel::<()>();
    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel::<()>();
    let mut session = Session::new(ctx, back_tx)?;

    let mut poller = ForegroundPoller::new(Handle::current());
    poller.start(every, move || {
        let _ = tick_tx.send(());
    });
    info!(every_secs = every.as_secs(), "watching for reminders");

    // First pass right away: reconcile the schedule and set the baseline.
    session.tick()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            Some(()) = tick_rx.recv() => session.tick()?,
            Some(()) = back_rx.recv() => session.back()?,
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => session.handle_input(&line)?,
                None => stdin_open = false,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    poller.stop();
    info!("stopped watching");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use desencosta_core::{Config, Database, UrgencyLevel};
    use std::sync::Arc;

    fn session() -> (Session, mpsc::UnboundedReceiver<()>) {
        let ctx = Context {
            db: Arc::new(Database::open_memory().unwrap()),
            config: Config::default(),
        };
        let (back_tx, back_rx) = mpsc::unbounded_channel();
        (Session::new(ctx, back_tx).unwrap(), back_rx)
    }

    #[tokio::test]
    async fn closed_prompt_drops_back_handler() {
        let (mut session, mut back_rx) = session();
        session.open_prompt();
        // The controller has no prompt open, as after reminders were disabled.
        session.sync_prompt();

        assert!(session.prompt.is_none());
        assert!(!session.modals.handle_back());
        assert!(back_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn back_without_reminder_keeps_urgency() {
        let (mut session, _back_rx) = session();
        session.back().unwrap();

        assert_eq!(session.controller.urgency().unwrap(), UrgencyLevel::Gentle);
        assert_eq!(session.controller.last_action().unwrap(), None);
    }
}
