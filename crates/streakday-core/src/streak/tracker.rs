//! Stateful streak tracker.
//!
//! Owns the single in-memory copy of [`StreakStats`] and serializes every
//! read-modify-write-persist sequence behind one mutex, so readers never see
//! a record with `longest_streak < current_streak`.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::stats::{DayTransition, StreakStats};
use crate::calendar::CalendarDay;
use crate::error::{CoreError, StreakError};
use crate::storage::StreakStore;

/// Result of a successful (or merely unpersisted) streak update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakUpdate {
    pub day: CalendarDay,
    pub before: StreakStats,
    pub after: StreakStats,
    pub transition: DayTransition,
}

impl StreakUpdate {
    /// Whether this update recorded a day that was not already complete.
    pub fn is_new_day(&self) -> bool {
        self.transition != DayTransition::SameDay
    }
}

pub struct StreakTracker {
    stats: Mutex<StreakStats>,
    store: Arc<dyn StreakStore>,
}

impl StreakTracker {
    /// Load persisted stats from `store`.
    ///
    /// Missing, corrupt or unreadable state falls back to zeroed stats; startup
    /// never fails because of it.
    pub fn load(store: Arc<dyn StreakStore>) -> Self {
        let stats = match store.load_stats() {
            Ok(Some(stats)) if stats.is_consistent() => stats,
            Ok(Some(stats)) => {
                warn!(?stats, "stored streak stats inconsistent, repairing");
                let fixed = stats.repaired();
                if let Err(e) = store.save_stats(&fixed) {
                    warn!(error = %e, "repaired streak stats not persisted");
                }
                fixed
            }
            Ok(None) => StreakStats::default(),
            Err(e) => {
                warn!(error = %e, "unreadable streak stats, starting from zero");
                StreakStats::default()
            }
        };
        Self::with_stats(store, stats)
    }

    pub fn with_stats(store: Arc<dyn StreakStore>, stats: StreakStats) -> Self {
        Self {
            stats: Mutex::new(stats),
            store,
        }
    }

    /// A consistent copy of the current counters.
    pub fn snapshot(&self) -> Result<StreakStats, StreakError> {
        self.stats
            .lock()
            .map(|guard| *guard)
            .map_err(|_| StreakError::LockPoisoned)
    }

    /// Record `day` as completed.
    ///
    /// Re-marking the last completed day is a no-op and is not written to
    /// storage.
    ///
    /// # Errors
    /// - [`StreakError::StaleCompletion`] if `day` precedes the last completed
    ///   day; nothing changes.
    /// - [`StreakError::Persistence`] if the write failed; the in-memory
    ///   counters keep the update.
    pub fn update_streak(&self, day: CalendarDay) -> Result<StreakUpdate, StreakError> {
        let mut guard = self.stats.lock().map_err(|_| StreakError::LockPoisoned)?;
        let before = *guard;
        let (after, transition) = before.advance(day)?;
        let update = StreakUpdate {
            day,
            before,
            after,
            transition,
        };

        if !update.is_new_day() {
            debug!(%day, "day already completed, counters unchanged");
            return Ok(update);
        }

        *guard = after;
        debug!(
            %day,
            ?transition,
            current = after.current_streak,
            longest = after.longest_streak,
            "streak updated"
        );

        match self.store.save_stats(&after) {
            Ok(()) => Ok(update),
            Err(source) => Err(StreakError::Persistence {
                update: Box::new(update),
                source,
            }),
        }
    }

    /// Zero all counters and persist. Explicit user action only.
    pub fn reset(&self) -> Result<(), CoreError> {
        let mut guard = self
            .stats
            .lock()
            .map_err(|e| CoreError::LockPoisoned(e.to_string()))?;
        *guard = StreakStats::default();
        self.store.save_stats(&guard)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::storage::MemoryStore;

    fn day(s: &str) -> CalendarDay {
        s.parse().unwrap()
    }

    #[test]
    fn update_persists_new_day() {
        let store = Arc::new(MemoryStore::new());
        let tracker = StreakTracker::load(store.clone());

        let update = tracker.update_streak(day("2026-02-01")).unwrap();
        assert_eq!(update.transition, DayTransition::First);

        let saved = store.load_stats().unwrap().unwrap();
        assert_eq!(saved, tracker.snapshot().unwrap());
        assert_eq!(saved.current_streak, 1);
    }

    #[test]
    fn reload_restores_state() {
        let store = Arc::new(MemoryStore::new());
        {
            let tracker = StreakTracker::load(store.clone());
            tracker.update_streak(day("2026-02-01")).unwrap();
            tracker.update_streak(day("2026-02-02")).unwrap();
        }
        let tracker = StreakTracker::load(store);
        let stats = tracker.snapshot().unwrap();
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.last_completed_date, Some(day("2026-02-02")));
    }

    #[test]
    fn stale_update_leaves_state_alone() {
        let store = Arc::new(MemoryStore::new());
        let tracker = StreakTracker::load(store);
        tracker.update_streak(day("2026-02-05")).unwrap();
        let before = tracker.snapshot().unwrap();

        let err = tracker.update_streak(day("2026-02-04")).unwrap_err();
        assert!(matches!(err, StreakError::StaleCompletion { .. }));
        assert_eq!(tracker.snapshot().unwrap(), before);
    }

    struct BrokenStore;

    impl StreakStore for BrokenStore {
        fn load_stats(&self) -> Result<Option<StreakStats>, StoreError> {
            Err(StoreError::Corrupt {
                record: "streak_stats".into(),
                message: "garbage".into(),
            })
        }
        fn save_stats(&self, _stats: &StreakStats) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk full".into()))
        }
        fn load_badges(&self) -> Result<std::collections::BTreeSet<u32>, StoreError> {
            Ok(Default::default())
        }
        fn save_badges(&self, _badges: &std::collections::BTreeSet<u32>) -> Result<(), StoreError> {
            Ok(())
        }
        fn load_checklist(
            &self,
            _day: CalendarDay,
        ) -> Result<Option<crate::checklist::DailyChecklist>, StoreError> {
            Ok(None)
        }
        fn save_checklist(
            &self,
            _checklist: &crate::checklist::DailyChecklist,
        ) -> Result<(), StoreError> {
            Ok(())
        }
        fn prune_checklists_before(&self, _day: CalendarDay) -> Result<usize, StoreError> {
            Ok(0)
        }
    }

    #[test]
    fn inconsistent_state_is_repaired_and_saved() {
        let broken = StreakStats {
            current_streak: 3,
            longest_streak: 3,
            total_days_completed: 3,
            last_completed_date: None,
        };
        let store = Arc::new(MemoryStore::with_stats(broken));
        let tracker = StreakTracker::load(store.clone());

        let expected = StreakStats {
            current_streak: 0,
            ..broken
        };
        assert_eq!(tracker.snapshot().unwrap(), expected);
        assert_eq!(store.load_stats().unwrap(), Some(expected));
        assert_eq!(store.stats_writes(), 1);

        StreakTracker::load(store.clone());
        assert_eq!(store.stats_writes(), 1);
    }

    #[test]
    fn corrupt_state_falls_back_to_default() {
        let tracker = StreakTracker::load(Arc::new(BrokenStore));
        assert_eq!(tracker.snapshot().unwrap(), StreakStats::default());
    }

    #[test]
    fn failed_write_keeps_in_memory_update() {
        let tracker = StreakTracker::load(Arc::new(BrokenStore));
        let err = tracker.update_streak(day("2026-02-01")).unwrap_err();
        match err {
            StreakError::Persistence { update, .. } => {
                assert_eq!(update.after.current_streak, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(tracker.snapshot().unwrap().current_streak, 1);

        // Same day again is a no-op and does not touch the broken store.
        let again = tracker.update_streak(day("2026-02-01")).unwrap();
        assert!(!again.is_new_day());
    }

    #[test]
    fn reset_zeroes_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let tracker = StreakTracker::load(store.clone());
        tracker.update_streak(day("2026-02-01")).unwrap();
        tracker.reset().unwrap();
        assert_eq!(tracker.snapshot().unwrap(), StreakStats::default());
        assert_eq!(store.load_stats().unwrap(), Some(StreakStats::default()));
    }
}
