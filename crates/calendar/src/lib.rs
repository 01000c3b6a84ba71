//! Calendar scheduling for goalplan.
//!
//! Places goal tasks into per-weekday working windows and mirrors the
//! result into a calendar store. All store access goes through a
//! [`CalendarGate`], which asks for permission once and serializes callers.

#![warn(missing_docs)]

pub mod access;
pub mod error;
pub mod file_store;
pub mod memory_store;
pub mod scheduler;
pub mod store;
pub mod sync;

pub use access::{CalendarAccess, CalendarGate};
pub use error::{CalendarError, Result, StoreError};
pub use file_store::FileCalendarStore;
pub use memory_store::InMemoryCalendarStore;
pub use scheduler::{available_days, plan, Schedule, Scheduler, BUFFER_MINUTES, HORIZON_DAYS};
pub use store::{CalendarRef, CalendarStore, NewEvent, StoredEvent};
pub use sync::{remove_existing, sync, RemovalReport, SyncReport, EVENT_TITLE_PREFIX};
