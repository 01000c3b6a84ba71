//! Calendar store backed by a JSON file.
//!
//! The command-line host has no system calendar, so events live in a single
//! `calendar.json` next to the rest of the data.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use goalplan_core::{CalendarEventId, Time};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::{CalendarRef, CalendarStore, NewEvent, StoredEvent};

/// File-based calendar store.
pub struct FileCalendarStore {
    path: PathBuf,
    calendar: CalendarRef,
}

impl FileCalendarStore {
    /// Store events in `path`, placing new events on `calendar`.
    pub fn new(path: impl AsRef<Path>, calendar: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            calendar: CalendarRef(calendar.into()),
        }
    }

    async fn read_events(&self) -> Result<Vec<StoredEvent>, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_events(&self, events: &[StoredEvent]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(events)?;
        fs::write(&self.path, json.as_bytes()).await?;
        Ok(())
    }
}

#[async_trait]
impl CalendarStore for FileCalendarStore {
    async fn request_access(&mut self) -> Result<bool, StoreError> {
        let Some(dir) = self.path.parent() else {
            return Ok(true);
        };
        match fs::create_dir_all(dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                warn!(path = %dir.display(), "calendar directory is not writable");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn default_calendar(&self) -> CalendarRef {
        self.calendar.clone()
    }

    async fn create_event(&mut self, event: NewEvent) -> Result<CalendarEventId, StoreError> {
        let mut events = self.read_events().await?;
        let id = CalendarEventId::new(ulid::Ulid::new().to_string());
        events.push(StoredEvent {
            id: id.clone(),
            title: event.title,
            start: event.start,
            end: event.end,
            calendar: event.calendar,
        });
        self.write_events(&events).await?;
        debug!(event_id = %id, "created calendar event");
        Ok(id)
    }

    async fn delete_event(&mut self, id: &CalendarEventId) -> Result<(), StoreError> {
        let mut events = self.read_events().await?;
        let before = events.len();
        events.retain(|e| &e.id != id);
        if events.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.write_events(&events).await
    }

    async fn query_events(&self, start: Time, end: Time) -> Result<Vec<StoredEvent>, StoreError> {
        let mut events: Vec<_> = self
            .read_events()
            .await?
            .into_iter()
            .filter(|e| e.overlaps(start, end))
            .collect();
        events.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn event(title: &str, start: Time) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            start,
            end: start + Duration::minutes(30),
            calendar: CalendarRef::default(),
        }
    }

    #[tokio::test]
    async fn test_create_query_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileCalendarStore::new(dir.path().join("cal").join("calendar.json"), "default");
        assert!(store.request_access().await.unwrap());

        let day = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let later = store.create_event(event("Goal: B", day + Duration::hours(2))).await.unwrap();
        let first = store.create_event(event("Goal: A", day)).await.unwrap();

        let found = store.query_events(day - Duration::days(1), day + Duration::days(1)).await.unwrap();
        let titles: Vec<_> = found.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Goal: A", "Goal: B"]);

        store.delete_event(&first).await.unwrap();
        let found = store.query_events(day - Duration::days(1), day + Duration::days(1)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, later);
    }

    #[tokio::test]
    async fn test_delete_unknown_event() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileCalendarStore::new(dir.path().join("calendar.json"), "default");

        let err = store.delete_event(&CalendarEventId::new("missing")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_query_outside_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileCalendarStore::new(dir.path().join("calendar.json"), "work");
        let day = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        store.create_event(event("Goal: A", day)).await.unwrap();

        let found = store.query_events(day + Duration::days(2), day + Duration::days(3)).await.unwrap();
        assert!(found.is_empty());
        assert_eq!(store.default_calendar(), CalendarRef("work".to_string()));
    }
}
