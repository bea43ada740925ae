//! Calendar-day normalization.
//!
//! Streaks are counted in whole calendar days, never in elapsed hours. Every
//! instant entering the engine goes through [`DayZone::day_of`] so that the
//! time-of-day is dropped in one fixed zone before any comparison happens.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A date with the time-of-day discarded.
///
/// Serialized as an ISO-8601 date (`YYYY-MM-DD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Day of `instant` as seen on the wall clock of its own zone.
    pub fn of<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self(instant.date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Whole days from `earlier` to `self`; negative when `self` comes first.
    pub fn days_since(&self, earlier: CalendarDay) -> i64 {
        (self.0 - earlier.0).num_days()
    }

    pub fn add_days(&self, days: i64) -> Option<Self> {
        self.0.checked_add_signed(Duration::days(days)).map(Self)
    }

    pub fn succ(&self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    pub fn pred(&self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for CalendarDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|e| ValidationError::InvalidValue {
                field: "date".to_string(),
                message: format!("'{s}' is not a YYYY-MM-DD date: {e}"),
            })
    }
}

/// The zone in which instants are cut into calendar days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DayZone {
    /// The system's local time zone (follows DST transitions).
    #[default]
    Local,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
}

impl DayZone {
    /// Build from an optional offset in minutes east of UTC; `None` means local.
    pub fn from_offset_minutes(minutes: Option<i32>) -> Result<Self, ValidationError> {
        match minutes {
            None => Ok(DayZone::Local),
            Some(m) => m
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .map(DayZone::Fixed)
                .ok_or_else(|| ValidationError::InvalidValue {
                    field: "calendar.utc_offset_minutes".to_string(),
                    message: format!("{m} is outside +/-24h"),
                }),
        }
    }

    pub fn day_of(&self, instant: DateTime<Utc>) -> CalendarDay {
        match self {
            DayZone::Local => CalendarDay::of(&instant.with_timezone(&Local)),
            DayZone::Fixed(offset) => CalendarDay::of(&instant.with_timezone(offset)),
        }
    }

    pub fn today(&self) -> CalendarDay {
        self.day_of(Utc::now())
    }

    /// The instant at which `day` shows `hour:minute` on this zone's clock.
    ///
    /// Returns `None` for an invalid time or a wall-clock time skipped by a
    /// DST transition. Ambiguous times resolve to the earlier instant.
    pub fn at(&self, day: CalendarDay, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
        let naive = day.date().and_hms_opt(hour, minute, 0)?;
        match self {
            DayZone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            DayZone::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}
