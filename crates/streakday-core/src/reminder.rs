//! Daily reminder timing.
//!
//! Registering notifications with the OS is left to the front end; this module
//! only decides when the next reminder should fire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::DayZone;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_hour")]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
}

fn default_true() -> bool {
    true
}
fn default_hour() -> u32 {
    8
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            hour: default_hour(),
            minute: 0,
        }
    }
}

impl ReminderSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.hour > 23 {
            return Err(ValidationError::InvalidValue {
                field: "reminders.hour".to_string(),
                message: format!("{} is not in 0..=23", self.hour),
            });
        }
        if self.minute > 59 {
            return Err(ValidationError::InvalidValue {
                field: "reminders.minute".to_string(),
                message: format!("{} is not in 0..=59", self.minute),
            });
        }
        Ok(())
    }
}

/// Next instant strictly after `now` at which the daily reminder fires.
///
/// Today is skipped once its checklist is complete. Returns `None` when
/// reminders are disabled or the settings are invalid.
pub fn next_reminder(
    settings: &ReminderSettings,
    zone: DayZone,
    now: DateTime<Utc>,
    today_completed: bool,
) -> Option<DateTime<Utc>> {
    if !settings.enabled || settings.validate().is_err() {
        return None;
    }

    let today = zone.day_of(now);
    let first = if today_completed { 1 } else { 0 };
    // A wall-clock time can vanish on a DST transition day; look a bit further.
    (first..first + 3).find_map(|offset| {
        let day = today.add_days(offset)?;
        zone.at(day, settings.hour, settings.minute)
            .filter(|at| *at > now)
    })
}
