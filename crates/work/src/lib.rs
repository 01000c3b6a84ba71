//! Goal management
//!
//! Creating, revising, scheduling and deleting goals on top of storage,
//! task generation, the calendar and reminders.

#![warn(missing_docs)]

pub mod error;
pub mod manager;
pub mod notify;

pub use error::{ErrorCategory, Result, WorkError};
pub use manager::{GoalManager, ScheduleOutcome, DEADLINE_REMINDER_TITLE, TASK_REMINDER_TITLE};
pub use notify::{LogNotifier, Notification, Notifier, RecordingNotifier};
