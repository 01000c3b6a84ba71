//! Calendar store abstraction.

use async_trait::async_trait;
use goalplan_core::{CalendarEventId, Time};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Reference to one calendar inside a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRef(pub String);

impl Default for CalendarRef {
    fn default() -> Self {
        Self("default".to_string())
    }
}

/// An event to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    /// Event title
    pub title: String,
    /// Start instant
    pub start: Time,
    /// End instant
    pub end: Time,
    /// Target calendar
    pub calendar: CalendarRef,
}

/// An event as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Store-issued id
    pub id: CalendarEventId,
    /// Event title
    pub title: String,
    /// Start instant
    pub start: Time,
    /// End instant
    pub end: Time,
    /// Calendar holding the event
    pub calendar: CalendarRef,
}

impl StoredEvent {
    /// Whether the event overlaps `[start, end]`.
    pub fn overlaps(&self, start: Time, end: Time) -> bool {
        self.start <= end && self.end >= start
    }
}

/// External calendar the scheduler writes into.
///
/// Implementations are not expected to serialize concurrent callers
/// themselves; [`crate::CalendarGate`] does that.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Ask for access. Called once per gate.
    async fn request_access(&mut self) -> Result<bool, StoreError>;

    /// Calendar new events go to.
    fn default_calendar(&self) -> CalendarRef;

    /// Create an event and return its id.
    async fn create_event(&mut self, event: NewEvent) -> Result<CalendarEventId, StoreError>;

    /// Delete an event by id.
    async fn delete_event(&mut self, id: &CalendarEventId) -> Result<(), StoreError>;

    /// Events overlapping `[start, end]`, ordered by start.
    async fn query_events(&self, start: Time, end: Time) -> Result<Vec<StoredEvent>, StoreError>;
}
