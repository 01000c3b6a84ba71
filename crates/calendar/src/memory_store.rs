//! In-memory calendar store for tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use goalplan_core::{CalendarEventId, Time};

use crate::error::StoreError;
use crate::store::{CalendarRef, CalendarStore, NewEvent, StoredEvent};

/// Calendar store held in memory, with switchable access and injectable
/// per-title failures.
#[derive(Debug, Default)]
pub struct InMemoryCalendarStore {
    events: Vec<StoredEvent>,
    grant: bool,
    access_requests: usize,
    queries: AtomicUsize,
    deletes: usize,
    next_id: u64,
    failing_saves: HashSet<String>,
    failing_deletes: HashSet<String>,
}

impl InMemoryCalendarStore {
    /// A store that grants access.
    pub fn granted() -> Self {
        Self {
            grant: true,
            ..Self::default()
        }
    }

    /// A store that refuses access.
    pub fn denied() -> Self {
        Self::default()
    }

    /// Fail creation of events with this exact title.
    pub fn fail_save_of(mut self, title: impl Into<String>) -> Self {
        self.failing_saves.insert(title.into());
        self
    }

    /// Fail deletion of events with this exact title.
    pub fn fail_delete_of(mut self, title: impl Into<String>) -> Self {
        self.failing_deletes.insert(title.into());
        self
    }

    /// Insert an event directly, bypassing access checks.
    pub fn seed(&mut self, title: impl Into<String>, start: Time, end: Time) -> CalendarEventId {
        let id = self.issue_id();
        self.events.push(StoredEvent {
            id: id.clone(),
            title: title.into(),
            start,
            end,
            calendar: CalendarRef::default(),
        });
        id
    }

    /// Everything currently stored.
    pub fn events(&self) -> &[StoredEvent] {
        &self.events
    }

    /// How many times access was requested.
    pub fn access_requests(&self) -> usize {
        self.access_requests
    }

    /// How many times events were queried.
    pub fn query_calls(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    /// How many deletions were attempted.
    pub fn delete_calls(&self) -> usize {
        self.deletes
    }

    fn issue_id(&mut self) -> CalendarEventId {
        self.next_id += 1;
        CalendarEventId::new(format!("mem-{}", self.next_id))
    }
}

#[async_trait]
impl CalendarStore for InMemoryCalendarStore {
    async fn request_access(&mut self) -> Result<bool, StoreError> {
        self.access_requests += 1;
        Ok(self.grant)
    }

    fn default_calendar(&self) -> CalendarRef {
        CalendarRef::default()
    }

    async fn create_event(&mut self, event: NewEvent) -> Result<CalendarEventId, StoreError> {
        if self.failing_saves.contains(&event.title) {
            return Err(StoreError::Rejected(format!("cannot save {}", event.title)));
        }
        let id = self.issue_id();
        self.events.push(StoredEvent {
            id: id.clone(),
            title: event.title,
            start: event.start,
            end: event.end,
            calendar: event.calendar,
        });
        Ok(id)
    }

    async fn delete_event(&mut self, id: &CalendarEventId) -> Result<(), StoreError> {
        self.deletes += 1;
        let Some(pos) = self.events.iter().position(|e| &e.id == id) else {
            return Err(StoreError::NotFound(id.clone()));
        };
        if self.failing_deletes.contains(&self.events[pos].title) {
            return Err(StoreError::Rejected(format!("cannot delete {}", id)));
        }
        self.events.remove(pos);
        Ok(())
    }

    async fn query_events(&self, start: Time, end: Time) -> Result<Vec<StoredEvent>, StoreError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let mut events: Vec<_> = self
            .events
            .iter()
            .filter(|e| e.overlaps(start, end))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(events)
    }
}
