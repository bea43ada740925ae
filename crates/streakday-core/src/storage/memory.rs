use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use super::StreakStore;
use crate::calendar::CalendarDay;
use crate::checklist::DailyChecklist;
use crate::error::StoreError;
use crate::streak::StreakStats;

#[derive(Default)]
struct MemoryState {
    stats: Option<StreakStats>,
    badges: BTreeSet<u32>,
    checklists: BTreeMap<CalendarDay, DailyChecklist>,
    stats_writes: usize,
}

/// In-process store. Nothing survives the process; used by tests and
/// throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing stats, as if loaded from an earlier run.
    pub fn with_stats(stats: StreakStats) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.stats = Some(stats);
        }
        store
    }

    /// Number of successful `save_stats` calls.
    pub fn stats_writes(&self) -> usize {
        self.lock().map(|s| s.stats_writes).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl StreakStore for MemoryStore {
    fn load_stats(&self) -> Result<Option<StreakStats>, StoreError> {
        Ok(self.lock()?.stats)
    }

    fn save_stats(&self, stats: &StreakStats) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.stats = Some(*stats);
        state.stats_writes += 1;
        Ok(())
    }

    fn load_badges(&self) -> Result<BTreeSet<u32>, StoreError> {
        Ok(self.lock()?.badges.clone())
    }

    fn save_badges(&self, badges: &BTreeSet<u32>) -> Result<(), StoreError> {
        self.lock()?.badges = badges.clone();
        Ok(())
    }

    fn load_checklist(&self, day: CalendarDay) -> Result<Option<DailyChecklist>, StoreError> {
        Ok(self.lock()?.checklists.get(&day).cloned())
    }

    fn save_checklist(&self, checklist: &DailyChecklist) -> Result<(), StoreError> {
        self.lock()?
            .checklists
            .insert(checklist.date, checklist.clone());
        Ok(())
    }

    fn prune_checklists_before(&self, day: CalendarDay) -> Result<usize, StoreError> {
        let mut state = self.lock()?;
        let kept = state.checklists.split_off(&day);
        let removed = std::mem::replace(&mut state.checklists, kept);
        Ok(removed.len())
    }
}
