//! Writing scheduled tasks to the calendar and taking them back out.

use chrono::Duration;
use goalplan_core::{CalendarEventId, Task, Time};
use tracing::{debug, info, warn};

use crate::access::CalendarAccess;
use crate::error::{Result, StoreError};
use crate::store::{CalendarStore, NewEvent};

/// Prefix on every event title this crate writes.
pub const EVENT_TITLE_PREFIX: &str = "Goal: ";

/// How far back the legacy title sweep looks.
pub const LOOKBACK_DAYS: i64 = 30;

/// How far ahead the legacy title sweep looks.
pub const LOOKAHEAD_DAYS: i64 = 365;

/// Outcome of [`sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Events created
    pub created: usize,
    /// Events the store refused
    pub failed: usize,
}

/// Outcome of [`remove_existing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// Events deleted
    pub removed: usize,
    /// Events the store failed to delete
    pub failed: usize,
}

/// Title used for a task's calendar event.
pub fn event_title(task: &Task) -> String {
    format!("{EVENT_TITLE_PREFIX}{}", task.title)
}

/// Create an event for every scheduled, unlinked task and link it back.
///
/// Store failures on single events are logged and counted, never raised.
pub async fn sync<C: CalendarStore>(
    access: &CalendarAccess<C>,
    tasks: &mut [Task],
    goal_title: &str,
) -> Result<SyncReport> {
    let mut store = access.store().await?;
    let calendar = store.default_calendar();
    let mut report = SyncReport::default();

    for task in tasks.iter_mut() {
        if task.calendar_event_id.is_some() {
            continue;
        }
        let (Some(start), Some(end)) = (task.scheduled_date, task.scheduled_end()) else {
            continue;
        };

        let event = NewEvent {
            title: event_title(task),
            start,
            end,
            calendar: calendar.clone(),
        };
        match store.create_event(event).await {
            Ok(id) => {
                debug!(task = %task.title, event_id = %id, "linked calendar event");
                task.calendar_event_id = Some(id);
                report.created += 1;
            }
            Err(e) => {
                warn!(task = %task.title, error = %e, "failed to save calendar event");
                report.failed += 1;
            }
        }
    }

    info!(goal = goal_title, created = report.created, failed = report.failed, "calendar synced");
    Ok(report)
}

/// Remove the calendar events previously written for these tasks.
///
/// Linked tasks are removed by id. If no task carries a link, events are
/// found by title instead, within [`LOOKBACK_DAYS`] before and
/// [`LOOKAHEAD_DAYS`] after `now`. Does nothing without calendar access.
pub async fn remove_existing<C: CalendarStore>(
    access: &CalendarAccess<C>,
    tasks: &mut [Task],
    goal_title: &str,
    now: Time,
) -> Result<RemovalReport> {
    if !access.is_granted() {
        debug!(goal = goal_title, "no calendar access, skipping event removal");
        return Ok(RemovalReport::default());
    }

    let report = if tasks.iter().any(|t| t.calendar_event_id.is_some()) {
        remove_linked(access, tasks).await?
    } else {
        sweep_by_title(access, tasks, goal_title, now).await?
    };

    info!(goal = goal_title, removed = report.removed, failed = report.failed, "calendar events removed");
    Ok(report)
}

async fn remove_linked<C: CalendarStore>(
    access: &CalendarAccess<C>,
    tasks: &mut [Task],
) -> Result<RemovalReport> {
    let mut store = access.store().await?;
    let mut report = RemovalReport::default();

    for task in tasks.iter_mut() {
        let Some(id) = task.calendar_event_id.clone() else {
            continue;
        };
        match store.delete_event(&id).await {
            Ok(()) => {
                task.calendar_event_id = None;
                report.removed += 1;
            }
            Err(StoreError::NotFound(_)) => {
                debug!(event_id = %id, "linked event already gone");
                task.calendar_event_id = None;
            }
            Err(e) => {
                warn!(event_id = %id, error = %e, "failed to delete calendar event");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

async fn sweep_by_title<C: CalendarStore>(
    access: &CalendarAccess<C>,
    tasks: &[Task],
    goal_title: &str,
    now: Time,
) -> Result<RemovalReport> {
    let mut store = access.store().await?;
    let events = store
        .query_events(now - Duration::days(LOOKBACK_DAYS), now + Duration::days(LOOKAHEAD_DAYS))
        .await?;

    let matches = |title: &str| {
        title.starts_with(EVENT_TITLE_PREFIX)
            && ((!goal_title.is_empty() && title.contains(goal_title))
                || tasks.iter().any(|t| !t.title.is_empty() && title.contains(t.title.as_str())))
    };

    let doomed: Vec<CalendarEventId> = events
        .into_iter()
        .filter(|e| matches(&e.title))
        .map(|e| e.id)
        .collect();

    let mut report = RemovalReport::default();
    for id in doomed {
        match store.delete_event(&id).await {
            Ok(()) => report.removed += 1,
            Err(e) => {
                warn!(event_id = %id, error = %e, "failed to delete calendar event");
                report.failed += 1;
            }
        }
    }
    Ok(report)
}
