//! Storage trait abstraction.

use async_trait::async_trait;
use goalplan_core::{
    validate_weekday, Goal, GoalId, Weekday, WorkWindow, WorkingHours, WorkingHoursError,
    DEFAULT_END_HOUR, DEFAULT_START_HOUR,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A persisted or requested setting is out of range
    #[error("Invalid setting: {0}")]
    InvalidSetting(#[from] WorkingHoursError),
}

/// Settings key holding a weekday's window start hour.
pub fn work_start_key(weekday: Weekday) -> String {
    format!("work_start_hour_{weekday}")
}

/// Settings key holding a weekday's window end hour.
pub fn work_end_key(weekday: Weekday) -> String {
    format!("work_end_hour_{weekday}")
}

/// Storage abstraction for goalplan data.
///
/// Goals are stored whole: tasks and milestones live inside their goal, so
/// deleting a goal removes them too. Settings are flat key-value pairs.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Goal operations ===

    /// Save a goal (create or update).
    async fn save_goal(&mut self, goal: &Goal) -> Result<()>;

    /// Load a goal by ID.
    async fn load_goal(&self, id: GoalId) -> Result<Option<Goal>>;

    /// List all goals, oldest first.
    async fn list_goals(&self) -> Result<Vec<Goal>>;

    /// Delete a goal together with its tasks and milestones.
    async fn delete_goal(&mut self, id: GoalId) -> Result<()>;

    // === Settings ===

    /// Read an integer setting.
    async fn get_setting(&self, key: &str) -> Result<Option<i64>>;

    /// Write an integer setting.
    async fn set_setting(&mut self, key: &str, value: i64) -> Result<()>;

    // === Working hours ===

    /// Snapshot the per-weekday working windows.
    ///
    /// A weekday with only one of its two keys set uses the default for the
    /// other.
    async fn load_working_hours(&self) -> Result<WorkingHours> {
        let mut hours = WorkingHours::new();
        for weekday in 1..=7u8 {
            let start = self.get_setting(&work_start_key(weekday)).await?;
            let end = self.get_setting(&work_end_key(weekday)).await?;
            if start.is_none() && end.is_none() {
                continue;
            }
            let start = hour_from_setting(start, DEFAULT_START_HOUR)?;
            let end = hour_from_setting(end, DEFAULT_END_HOUR)?;
            hours.set(weekday, WorkWindow::new(start, end)?)?;
        }
        Ok(hours)
    }

    /// Persist one weekday's working window.
    async fn save_work_window(&mut self, weekday: Weekday, window: WorkWindow) -> Result<()> {
        validate_weekday(weekday)?;
        let window = WorkWindow::new(window.start_hour, window.end_hour)?;
        self.set_setting(&work_start_key(weekday), i64::from(window.start_hour)).await?;
        self.set_setting(&work_end_key(weekday), i64::from(window.end_hour)).await?;
        Ok(())
    }
}

fn hour_from_setting(value: Option<i64>, default: u8) -> Result<u8> {
    match value {
        None => Ok(default),
        Some(v) => u8::try_from(v)
            .ok()
            .filter(|h| *h <= 23)
            .ok_or(StorageError::InvalidSetting(WorkingHoursError::InvalidHour(
                v.clamp(0, i64::from(u8::MAX)) as u8,
            ))),
    }
}
