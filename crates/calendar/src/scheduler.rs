//! Day-by-day placement of tasks into working windows.
//!
//! Tasks are placed strictly in input order. Each day gets a soft quota of
//! `total minutes / available days`; the quota never blocks the first task of
//! a day. A 15-minute buffer follows every task. If the day cursor passes
//! `deadline + 365 days` the run stops and the remaining tasks stay
//! unscheduled.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use goalplan_core::{Task, Time, WorkingHours};

pub use goalplan_core::MIN_TASK_MINUTES;
use tracing::{debug, info, warn};

use crate::access::CalendarAccess;
use crate::error::Result;
use crate::store::CalendarStore;

/// Gap left after every placed task.
pub const BUFFER_MINUTES: i64 = 15;

/// Days past the deadline after which scheduling gives up.
pub const HORIZON_DAYS: i64 = 365;

/// Outcome of one scheduling run.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    /// Tasks in input order; placed ones carry `scheduled_date`.
    pub tasks: Vec<Task>,

    /// False when the horizon ran out with tasks still unplaced.
    pub fully_scheduled: bool,
}

impl Schedule {
    fn empty() -> Self {
        Self {
            tasks: Vec::new(),
            fully_scheduled: true,
        }
    }

    /// Tasks that were given a slot.
    pub fn placed(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.scheduled_date.is_some())
    }

    /// Number of tasks left without a slot.
    pub fn unscheduled_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.scheduled_date.is_none()).count()
    }
}

/// Schedules tasks against one working-hours snapshot and time zone.
#[derive(Debug, Clone)]
pub struct Scheduler {
    hours: WorkingHours,
    tz: Tz,
}

impl Scheduler {
    /// Create a scheduler.
    pub fn new(hours: WorkingHours, tz: Tz) -> Self {
        Self { hours, tz }
    }

    /// Working hours in use.
    pub fn hours(&self) -> &WorkingHours {
        &self.hours
    }

    /// Time zone days are computed in.
    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    /// Place `tasks` between `start` and `deadline`.
    ///
    /// Fails with `PermissionDenied` before doing anything if `access` was
    /// not granted. Running out of horizon is not an error; check
    /// [`Schedule::fully_scheduled`].
    pub fn schedule<C: CalendarStore>(
        &self,
        access: &CalendarAccess<C>,
        tasks: &[Task],
        start: Time,
        deadline: Time,
    ) -> Result<Schedule> {
        access.ensure_granted()?;
        Ok(plan(tasks, start, deadline, &self.hours, self.tz))
    }
}

/// Local wall-clock `hour:00` on `date`, as a UTC instant.
///
/// In a DST gap the hour after is used.
fn local_instant(tz: Tz, date: NaiveDate, hour: u8) -> Time {
    let naive: NaiveDateTime = date.and_time(NaiveTime::MIN) + Duration::hours(i64::from(hour));
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

fn local_date(tz: Tz, instant: Time) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Inclusive count of local calendar days from `start` to `deadline`,
/// never below 1.
pub fn available_days(start: Time, deadline: Time, tz: Tz) -> i64 {
    let days = (local_date(tz, deadline) - local_date(tz, start)).num_days() + 1;
    days.max(1)
}

/// Pure placement step. Deterministic for fixed inputs.
///
/// Any `scheduled_date` already present on the input tasks is discarded.
pub fn plan(tasks: &[Task], start: Time, deadline: Time, hours: &WorkingHours, tz: Tz) -> Schedule {
    if tasks.is_empty() {
        return Schedule::empty();
    }

    let mut scheduled: Vec<Task> = tasks
        .iter()
        .cloned()
        .map(|mut t| {
            t.scheduled_date = None;
            t
        })
        .collect();

    let total_minutes: u64 = scheduled.iter().map(|t| u64::from(t.effective_minutes())).sum();
    let days = available_days(start, deadline, tz);
    let minutes_per_day = total_minutes as f64 / days as f64;
    let horizon = deadline + Duration::days(HORIZON_DAYS);

    debug!(total_minutes, days, minutes_per_day, "planning schedule");

    let first_day = local_date(tz, start);
    let mut day = first_day;
    let mut index = 0;
    let mut fully_scheduled = true;

    while index < scheduled.len() {
        let window = hours.window_for(day);
        let window_start = local_instant(tz, day, window.start_hour);
        let window_end = local_instant(tz, day, window.end_hour);
        let mut cursor = window_start;
        if day == first_day && start > cursor {
            cursor = start;
        }

        let mut day_minutes = 0.0_f64;
        let mut placed_today = 0usize;

        while index < scheduled.len() {
            let minutes = scheduled[index].effective_minutes();
            let duration = Duration::minutes(i64::from(minutes));

            let fits = cursor + duration <= window_end;
            // A task longer than the whole window would never fit; it gets
            // a day to itself, starting when that day's window opens.
            let oversized_first =
                placed_today == 0 && cursor == window_start && i64::from(minutes) > window.minutes();
            if !fits && !oversized_first {
                break;
            }
            if placed_today > 0 && day_minutes >= minutes_per_day {
                break;
            }

            scheduled[index].scheduled_date = Some(cursor);
            debug!(task = %scheduled[index].title, at = %cursor, "placed task");

            cursor = cursor + duration + Duration::minutes(BUFFER_MINUTES);
            day_minutes += f64::from(minutes);
            placed_today += 1;
            index += 1;
        }

        let Some(next) = day.succ_opt() else {
            fully_scheduled = index >= scheduled.len();
            break;
        };
        day = next;

        if index < scheduled.len() && local_instant(tz, day, 0) > horizon {
            warn!(
                remaining = scheduled.len() - index,
                "could not fit all tasks within the scheduling horizon"
            );
            fully_scheduled = false;
            break;
        }
    }

    info!(
        placed = index,
        total = scheduled.len(),
        "schedule planned"
    );

    Schedule {
        tasks: scheduled,
        fully_scheduled,
    }
}
