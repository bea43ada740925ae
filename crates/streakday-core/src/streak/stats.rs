use serde::{Deserialize, Serialize};

use crate::calendar::CalendarDay;
use crate::error::StreakError;

/// Aggregate streak counters, persisted as a single flat record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakStats {
    /// Consecutive completed days ending at `last_completed_date`.
    pub current_streak: u32,
    /// Largest `current_streak` ever observed.
    pub longest_streak: u32,
    /// Distinct calendar days marked complete.
    pub total_days_completed: u32,
    /// `None` only before the first-ever completion.
    pub last_completed_date: Option<CalendarDay>,
}

/// How a completion day relates to the previously recorded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayTransition {
    /// No day was ever completed before.
    First,
    /// The same day was completed again; counters are untouched.
    SameDay,
    /// The day right after the last completed one.
    Consecutive,
    /// One or more days were skipped; the streak restarts at 1.
    Gap { missed_days: u32 },
}

impl StreakStats {
    /// Classify `day` against the last completed day and return the new
    /// counters. `self` is never modified.
    ///
    /// # Errors
    /// Returns [`StreakError::StaleCompletion`] when `day` precedes the last
    /// completed day.
    pub fn advance(&self, day: CalendarDay) -> Result<(StreakStats, DayTransition), StreakError> {
        let mut next = *self;

        let transition = match self.last_completed_date {
            None => {
                next.current_streak = 1;
                DayTransition::First
            }
            Some(last) => match day.days_since(last) {
                0 => return Ok((next, DayTransition::SameDay)),
                1 => {
                    next.current_streak = self.current_streak.saturating_add(1);
                    DayTransition::Consecutive
                }
                d if d > 1 => {
                    next.current_streak = 1;
                    DayTransition::Gap {
                        missed_days: u32::try_from(d - 1).unwrap_or(u32::MAX),
                    }
                }
                _ => {
                    return Err(StreakError::StaleCompletion {
                        day,
                        last_completed: last,
                    })
                }
            },
        };

        next.longest_streak = next.longest_streak.max(next.current_streak);
        next.total_days_completed = next.total_days_completed.saturating_add(1);
        next.last_completed_date = Some(day);
        Ok((next, transition))
    }

    /// The streak that is still alive on `today`.
    ///
    /// `current_streak` is only reset lazily by the next completion, so a
    /// streak whose last day is older than yesterday reads as 0 here.
    pub fn active_streak(&self, today: CalendarDay) -> u32 {
        match self.last_completed_date {
            Some(last) if today.days_since(last) <= 1 => self.current_streak,
            _ => 0,
        }
    }

    pub fn completed_on(&self, day: CalendarDay) -> bool {
        self.last_completed_date == Some(day)
    }

    pub fn is_consistent(&self) -> bool {
        self.longest_streak >= self.current_streak
            && (self.last_completed_date.is_some() || self.current_streak == 0)
    }

    /// Make a record read from storage satisfy [`Self::is_consistent`].
    ///
    /// A running streak without a last completed day cannot be continued, so
    /// it drops to 0; `longest_streak` is then raised to cover `current_streak`.
    pub fn repaired(mut self) -> Self {
        if self.last_completed_date.is_none() {
            self.current_streak = 0;
        }
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> CalendarDay {
        s.parse().unwrap()
    }

    fn stats(current: u32, longest: u32, total: u32, last: &str) -> StreakStats {
        StreakStats {
            current_streak: current,
            longest_streak: longest,
            total_days_completed: total,
            last_completed_date: Some(day(last)),
        }
    }

    #[test]
    fn first_completion_starts_streak() {
        let (next, transition) = StreakStats::default().advance(day("2026-04-01")).unwrap();
        assert_eq!(transition, DayTransition::First);
        assert_eq!(next, stats(1, 1, 1, "2026-04-01"));
    }

    #[test]
    fn same_day_is_noop() {
        let before = stats(4, 9, 20, "2026-04-01");
        let (next, transition) = before.advance(day("2026-04-01")).unwrap();
        assert_eq!(transition, DayTransition::SameDay);
        assert_eq!(next, before);
    }

    #[test]
    fn consecutive_day_increments() {
        let (next, transition) = stats(4, 9, 20, "2026-04-01")
            .advance(day("2026-04-02"))
            .unwrap();
        assert_eq!(transition, DayTransition::Consecutive);
        assert_eq!(next, stats(5, 9, 21, "2026-04-02"));
    }

    #[test]
    fn gap_resets_to_one() {
        let (next, transition) = stats(4, 4, 20, "2026-04-01")
            .advance(day("2026-04-05"))
            .unwrap();
        assert_eq!(transition, DayTransition::Gap { missed_days: 3 });
        assert_eq!(next, stats(1, 4, 21, "2026-04-05"));
    }

    #[test]
    fn earlier_day_is_rejected() {
        let before = stats(4, 4, 20, "2026-04-01");
        let err = before.advance(day("2026-03-31")).unwrap_err();
        assert!(matches!(err, StreakError::StaleCompletion { .. }));
    }

    #[test]
    fn consecutive_day_across_month_and_year() {
        let (next, _) = stats(2, 2, 2, "2025-12-31")
            .advance(day("2026-01-01"))
            .unwrap();
        assert_eq!(next.current_streak, 3);
    }

    #[test]
    fn active_streak_expires_after_a_missed_day() {
        let s = stats(6, 6, 6, "2026-04-10");
        assert_eq!(s.active_streak(day("2026-04-10")), 6);
        assert_eq!(s.active_streak(day("2026-04-11")), 6);
        assert_eq!(s.active_streak(day("2026-04-12")), 0);
        assert_eq!(StreakStats::default().active_streak(day("2026-04-12")), 0);
    }

    #[test]
    fn repaired_restores_longest_invariant() {
        let broken = stats(5, 2, 5, "2026-04-10");
        assert!(!broken.is_consistent());
        let fixed = broken.repaired();
        assert!(fixed.is_consistent());
        assert_eq!(fixed.longest_streak, 5);
    }

    #[test]
    fn repaired_drops_streak_without_last_day() {
        let broken = StreakStats {
            current_streak: 4,
            longest_streak: 6,
            total_days_completed: 9,
            last_completed_date: None,
        };
        assert!(!broken.is_consistent());
        let fixed = broken.repaired();
        assert!(fixed.is_consistent());
        assert_eq!(fixed.current_streak, 0);
        assert_eq!(fixed.longest_streak, 6);
        assert_eq!(fixed.total_days_completed, 9);
    }

    #[test]
    fn serializes_flat_record() {
        let json = serde_json::to_value(stats(2, 3, 4, "2026-04-10")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "current_streak": 2,
                "longest_streak": 3,
                "total_days_completed": 4,
                "last_completed_date": "2026-04-10"
            })
        );
        let empty = serde_json::to_value(StreakStats::default()).unwrap();
        assert!(empty["last_completed_date"].is_null());
    }
}
