//! goalplan core data models.
//!
//! Goals own an ordered task list and a set of milestones; working hours
//! describe where on the calendar those tasks may land.

#![warn(missing_docs)]

// Core identities
mod id;

// Goal planning
mod goal;
mod milestone;
mod task;

// Calendar windows
mod working_hours;

// Re-exports
pub use id::*;

pub use goal::{Goal, GoalProgress};
pub use milestone::Milestone;
pub use task::{Task, TaskRecurrence, TaskStatus, MIN_TASK_MINUTES};
pub use working_hours::{
    validate_weekday, weekday_name, weekday_of, Weekday, WorkWindow, WorkingHours,
    WorkingHoursError, DEFAULT_END_HOUR, DEFAULT_START_HOUR,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
