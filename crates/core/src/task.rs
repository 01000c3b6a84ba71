//! Task model - the atomic unit of work inside a goal.

use serde::{Deserialize, Serialize};
use crate::id::{CalendarEventId, TaskId};
use crate::Time;

/// Shortest duration a task is given on the calendar. Zero-minute tasks
/// are treated as this long.
pub const MIN_TASK_MINUTES: u32 = 1;

/// A single unit of work with an estimated duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Task title
    pub title: String,

    /// Estimated duration in minutes
    pub estimated_minutes: u32,

    /// Current status
    pub status: TaskStatus,

    /// Start instant assigned by the scheduler
    pub scheduled_date: Option<Time>,

    /// Recurrence setting. Metadata only; the scheduler ignores it.
    #[serde(default)]
    pub recurrence: TaskRecurrence,

    /// Event created for this task in the external calendar, if any.
    #[serde(default)]
    pub calendar_event_id: Option<CalendarEventId>,
}

/// Task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting to be done
    Pending,
    /// Done
    Completed,
    /// Deliberately not done
    Skipped,
}

/// How a task repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskRecurrence {
    /// One-off
    #[default]
    None,
    /// Every day
    Daily,
    /// Every week
    Weekly,
    /// Monday through Friday
    Weekdays,
}

impl Task {
    /// Create a pending, unscheduled task.
    pub fn new(title: impl Into<String>, estimated_minutes: u32) -> Self {
        Self {
            id: TaskId::new(),
            title: title.into(),
            estimated_minutes,
            status: TaskStatus::Pending,
            scheduled_date: None,
            recurrence: TaskRecurrence::None,
            calendar_event_id: None,
        }
    }

    /// Set the recurrence.
    pub fn with_recurrence(mut self, recurrence: TaskRecurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    /// Whether the task is completed.
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Toggle between completed and pending. A skipped task becomes completed.
    pub fn toggle(&mut self) {
        self.status = match self.status {
            TaskStatus::Completed => TaskStatus::Pending,
            TaskStatus::Pending | TaskStatus::Skipped => TaskStatus::Completed,
        };
    }

    /// Duration the task occupies once placed, never below [`MIN_TASK_MINUTES`].
    pub fn effective_minutes(&self) -> u32 {
        self.estimated_minutes.max(MIN_TASK_MINUTES)
    }

    /// End instant of the scheduled block, if scheduled.
    pub fn scheduled_end(&self) -> Option<Time> {
        self.scheduled_date
            .map(|start| start + chrono::Duration::minutes(i64::from(self.effective_minutes())))
    }
}

impl TaskStatus {
    /// Lowercase name, as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_toggle_cycles_status() {
        let mut task = Task::new("Draft outline", 30);
        task.toggle();
        assert_eq!(task.status, TaskStatus::Completed);
        task.toggle();
        assert_eq!(task.status, TaskStatus::Pending);

        task.status = TaskStatus::Skipped;
        task.toggle();
        assert!(task.is_completed());
    }

    #[test]
    fn test_scheduled_end() {
        let mut task = Task::new("Research", 45);
        assert!(task.scheduled_end().is_none());

        let start = chrono::Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        task.scheduled_date = Some(start);
        assert_eq!(
            task.scheduled_end(),
            Some(chrono::Utc.with_ymd_and_hms(2026, 3, 2, 9, 45, 0).unwrap())
        );
    }

    #[test]
    fn test_loads_without_optional_fields() {
        let id = TaskId::new();
        let json = format!(
            r#"{{"id":"{id}","title":"Old task","estimated_minutes":20,"status":"pending","scheduled_date":null}}"#
        );
        let task: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(task.recurrence, TaskRecurrence::None);
        assert_eq!(task.calendar_event_id, None);
    }

    #[test]
    fn test_zero_minute_task_occupies_the_floor() {
        let start = chrono::Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let mut task = Task::new("Quick check", 0);
        task.scheduled_date = Some(start);

        assert_eq!(task.effective_minutes(), MIN_TASK_MINUTES);
        assert_eq!(
            task.scheduled_end(),
            Some(start + chrono::Duration::minutes(i64::from(MIN_TASK_MINUTES)))
        );
    }

    #[test]
    fn test_recurrence_defaults_to_none() {
        let task = Task::new("Stretch", 10);
        assert_eq!(task.recurrence, TaskRecurrence::None);

        let weekly = task.with_recurrence(TaskRecurrence::Weekly);
        let json = serde_json::to_value(&weekly).unwrap();
        assert_eq!(json["recurrence"], "weekly");
    }
}
