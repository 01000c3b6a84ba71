//! Per-weekday working windows.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Default window start hour.
pub const DEFAULT_START_HOUR: u8 = 9;

/// Default window end hour.
pub const DEFAULT_END_HOUR: u8 = 18;

/// Weekday number, 1 = Sunday through 7 = Saturday.
pub type Weekday = u8;

/// Errors from building a working-hours table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkingHoursError {
    /// Weekday outside 1..=7
    #[error("weekday must be 1 (Sunday) through 7 (Saturday), got {0}")]
    InvalidWeekday(u8),

    /// Hour outside 0..=23
    #[error("hour must be 0 through 23, got {0}")]
    InvalidHour(u8),

    /// Window that closes at or before it opens
    #[error("working window must end after it starts, got {start}-{end}")]
    EmptyWindow {
        /// Requested start hour
        start: u8,
        /// Requested end hour
        end: u8,
    },
}

/// Clock-hour range [start_hour, end_hour) during which tasks may be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWindow {
    /// First working hour
    pub start_hour: u8,
    /// Hour the window closes
    pub end_hour: u8,
}

impl WorkWindow {
    /// Build a window, validating both hours and that it is not empty.
    pub fn new(start_hour: u8, end_hour: u8) -> Result<Self, WorkingHoursError> {
        for hour in [start_hour, end_hour] {
            if hour > 23 {
                return Err(WorkingHoursError::InvalidHour(hour));
            }
        }
        if start_hour >= end_hour {
            return Err(WorkingHoursError::EmptyWindow {
                start: start_hour,
                end: end_hour,
            });
        }
        Ok(Self { start_hour, end_hour })
    }

    /// Window length in minutes.
    pub fn minutes(&self) -> i64 {
        (i64::from(self.end_hour) - i64::from(self.start_hour)).max(0) * 60
    }
}

impl Default for WorkWindow {
    fn default() -> Self {
        Self {
            start_hour: DEFAULT_START_HOUR,
            end_hour: DEFAULT_END_HOUR,
        }
    }
}

/// Immutable snapshot of the user's per-weekday working windows.
///
/// Unset weekdays fall back to 9-18.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    windows: BTreeMap<Weekday, WorkWindow>,
}

impl WorkingHours {
    /// Table with every weekday on the default window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one weekday's window.
    pub fn set(&mut self, weekday: Weekday, window: WorkWindow) -> Result<(), WorkingHoursError> {
        validate_weekday(weekday)?;
        self.windows.insert(weekday, window);
        Ok(())
    }

    /// Builder form of [`WorkingHours::set`].
    pub fn with(mut self, weekday: Weekday, start_hour: u8, end_hour: u8) -> Result<Self, WorkingHoursError> {
        self.set(weekday, WorkWindow::new(start_hour, end_hour)?)?;
        Ok(self)
    }

    /// Window for a weekday number.
    pub fn lookup(&self, weekday: Weekday) -> WorkWindow {
        self.windows.get(&weekday).copied().unwrap_or_default()
    }

    /// Window for a calendar date.
    pub fn window_for(&self, date: NaiveDate) -> WorkWindow {
        self.lookup(weekday_of(date))
    }

    /// Explicitly configured weekdays.
    pub fn configured(&self) -> impl Iterator<Item = (Weekday, WorkWindow)> + '_ {
        self.windows.iter().map(|(d, w)| (*d, *w))
    }
}

/// Weekday number of a date, 1 = Sunday.
pub fn weekday_of(date: NaiveDate) -> Weekday {
    date.weekday().number_from_sunday() as Weekday
}

/// Check a weekday number.
pub fn validate_weekday(weekday: Weekday) -> Result<(), WorkingHoursError> {
    if (1..=7).contains(&weekday) {
        Ok(())
    } else {
        Err(WorkingHoursError::InvalidWeekday(weekday))
    }
}

/// English name of a weekday number.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        1 => "Sunday",
        2 => "Monday",
        3 => "Tuesday",
        4 => "Wednesday",
        5 => "Thursday",
        6 => "Friday",
        7 => "Saturday",
        _ => "?",
    }
}
