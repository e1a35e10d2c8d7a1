//! Active-window arithmetic.
//!
//! Converts a daily clock window and a notification count into concrete
//! trigger instants for the current day. Everything here is pure: the caller
//! passes `now` in whatever time zone the user lives in.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::error::ReminderError;

/// Upper bound on slots per day; also the size of the reserved id range.
pub const MAX_DAILY_NOTIFICATIONS: usize = 20;

/// Daily span during which reminders may fire.
///
/// An `end` at or before `start` means the window runs past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ActiveWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn wraps_midnight(&self) -> bool {
        self.end <= self.start
    }

    /// Length of the window, always positive (a zero-length window is a full day).
    pub fn duration(&self) -> Duration {
        let diff = self.end.signed_duration_since(self.start);
        if diff <= Duration::zero() {
            diff + Duration::days(1)
        } else {
            diff
        }
    }

    /// Offsets from window start for each slot.
    ///
    /// With more than one slot the window is cut into `count - 1` equal
    /// intervals so the first slot is the start and the last is the end.
    fn slot_offsets(&self, count: u32) -> Result<Vec<Duration>, ReminderError> {
        check_count(count)?;
        if count == 1 {
            return Ok(vec![Duration::zero()]);
        }
        let total_secs = self.duration().num_seconds();
        let intervals = i64::from(count - 1);
        Ok((0..i64::from(count))
            .map(|i| Duration::seconds(total_secs * i / intervals))
            .collect())
    }

    /// Every slot of the day as a clock time, including ones already passed.
    pub fn slot_times(&self, count: u32) -> Result<Vec<NaiveTime>, ReminderError> {
        Ok(self
            .slot_offsets(count)?
            .into_iter()
            .map(|offset| self.start + offset)
            .collect())
    }
}

fn check_count(count: u32) -> Result<(), ReminderError> {
    if count == 0 || count as usize > MAX_DAILY_NOTIFICATIONS {
        return Err(ReminderError::invalid(
            "daily_notification_count",
            format!("must be between 1 and {MAX_DAILY_NOTIFICATIONS}, got {count}"),
        ));
    }
    Ok(())
}

/// Resolve a wall-clock time in `tz`, stepping over DST gaps.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}

/// Calendar day on which the window in progress, or the next one to open,
/// started.
///
/// Between midnight and the end of a window that runs past midnight this is
/// yesterday.
pub fn window_day<Tz: TimeZone>(window: &ActiveWindow, now: &DateTime<Tz>) -> NaiveDate {
    let today = now.date_naive();
    if window.wraps_midnight() && now.time() < window.end {
        today.pred_opt().unwrap_or(today)
    } else {
        today
    }
}

/// Trigger instants of the [`window_day`] window that are still ahead of
/// `now`.
///
/// Slots that have already passed are dropped, not moved to tomorrow;
/// scheduling the next window happens on the next reschedule.
///
/// # Errors
/// `InvalidConfiguration` when `count` is zero or above
/// [`MAX_DAILY_NOTIFICATIONS`].
pub fn compute_trigger_instants<Tz: TimeZone>(
    window: &ActiveWindow,
    count: u32,
    now: &DateTime<Tz>,
) -> Result<Vec<DateTime<Tz>>, ReminderError> {
    let offsets = window.slot_offsets(count)?;
    let tz = now.timezone();
    let start = resolve_local(&tz, window_day(window, now).and_time(window.start));

    Ok(offsets
        .into_iter()
        .map(|offset| start.clone() + offset)
        .filter(|instant| instant > now)
        .collect())
}

/// Window length divided by `count`, in whole minutes (floored).
///
/// # Errors
/// `InvalidConfiguration` when `count` is zero.
pub fn compute_average_interval(window: &ActiveWindow, count: u32) -> Result<u32, ReminderError> {
    if count == 0 {
        return Err(ReminderError::invalid(
            "daily_notification_count",
            "must be greater than zero",
        ));
    }
    let total = window.duration().num_minutes();
    Ok((total / i64::from(count)) as u32)
}
