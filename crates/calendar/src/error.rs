//! Calendar error types.

use goalplan_core::CalendarEventId;

/// Result type for calendar operations.
pub type Result<T> = std::result::Result<T, CalendarError>;

/// Errors surfaced by scheduling and sync.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    /// Calendar access has not been granted
    #[error("calendar access not granted")]
    PermissionDenied,

    /// The calendar store failed as a whole
    #[error("calendar store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from a single calendar store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No event with this id
    #[error("event not found: {0}")]
    NotFound(CalendarEventId),

    /// The store refused the write
    #[error("rejected by calendar store: {0}")]
    Rejected(String),
}
