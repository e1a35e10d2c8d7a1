use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Repeating foreground check.
///
/// Holds at most one task: starting again replaces the previous loop, so
/// remounting a screen never leaves two timers running.
pub struct ForegroundPoller {
    runtime: Handle,
    handle: Option<JoinHandle<()>>,
}

impl ForegroundPoller {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            handle: None,
        }
    }

    /// Call `on_tick` every `every`, first one period from now.
    pub fn start<F>(&mut self, every: Duration, mut on_tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.stop();
        let handle = self.runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                on_tick();
            }
        });
        self.handle = Some(handle);
        debug!(every_secs = every.as_secs(), "foreground poller started");
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("foreground poller stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ForegroundPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
