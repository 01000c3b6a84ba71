//! Errors surfaced by goal management.

use goalplan_ai::AiError;
use goalplan_calendar::CalendarError;
use goalplan_core::{GoalId, MilestoneId, TaskId};
use goalplan_storage::StorageError;

/// Result type for goal management.
pub type Result<T> = std::result::Result<T, WorkError>;

/// Coarse grouping used to pick what to tell the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Something the user has to set up: calendar permission, API key
    Configuration,
    /// The AI answered with something unusable
    UpstreamResponse,
    /// A referenced goal, task or milestone does not exist
    NotFound,
    /// Anything else
    Generic,
}

/// Goal management errors.
#[derive(Debug, thiserror::Error)]
pub enum WorkError {
    /// Persistence failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Calendar access or store failed
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// Task generation failed
    #[error(transparent)]
    Ai(#[from] AiError),

    /// No such goal
    #[error("goal not found: {0}")]
    GoalNotFound(GoalId),

    /// No such task in the goal
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// No such milestone in the goal
    #[error("milestone not found: {0}")]
    MilestoneNotFound(MilestoneId),

    /// Rejected input
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl WorkError {
    /// Which kind of failure this is.
    pub fn category(&self) -> ErrorCategory {
        match self {
            WorkError::Calendar(CalendarError::PermissionDenied)
            | WorkError::Ai(AiError::Unauthorized(_))
            | WorkError::Ai(AiError::MissingApiKey(_)) => ErrorCategory::Configuration,
            WorkError::Ai(AiError::Parse(_)) => ErrorCategory::UpstreamResponse,
            WorkError::GoalNotFound(_)
            | WorkError::TaskNotFound(_)
            | WorkError::MilestoneNotFound(_)
            | WorkError::Storage(StorageError::NotFound(_)) => ErrorCategory::NotFound,
            _ => ErrorCategory::Generic,
        }
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            WorkError::Calendar(CalendarError::PermissionDenied) => {
                "Calendar access is not granted. Allow access to the calendar and try again.".to_string()
            }
            WorkError::Ai(AiError::Unauthorized(_)) => {
                "The AI service rejected the API key. Check the configured key.".to_string()
            }
            WorkError::Ai(AiError::MissingApiKey(var)) => {
                format!("No AI API key is configured. Set {var} and try again.")
            }
            WorkError::Ai(AiError::Parse(_)) => {
                "The AI response could not be understood. Please try again.".to_string()
            }
            WorkError::InvalidInput(reason) => reason.clone(),
            e if e.category() == ErrorCategory::NotFound => e.to_string(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}
