mod config;
pub mod database;
mod memory;

pub use config::{BadgesConfig, CalendarConfig, ChecklistConfig, Config};
pub use database::Database;
pub use memory::MemoryStore;

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::calendar::CalendarDay;
use crate::checklist::DailyChecklist;
use crate::error::StoreError;
use crate::streak::StreakStats;

/// Durable storage for everything the engine must survive a restart with.
///
/// Each `save_*` call must be atomic: a reader never observes a partially
/// written record.
pub trait StreakStore: Send + Sync {
    /// `Ok(None)` before the first-ever save.
    fn load_stats(&self) -> Result<Option<StreakStats>, StoreError>;

    fn save_stats(&self, stats: &StreakStats) -> Result<(), StoreError>;

    /// Badge thresholds already unlocked.
    fn load_badges(&self) -> Result<BTreeSet<u32>, StoreError>;

    fn save_badges(&self, badges: &BTreeSet<u32>) -> Result<(), StoreError>;

    fn load_checklist(&self, day: CalendarDay) -> Result<Option<DailyChecklist>, StoreError>;

    fn save_checklist(&self, checklist: &DailyChecklist) -> Result<(), StoreError>;

    /// Drop stored checklists for days before `day`. Returns how many went.
    fn prune_checklists_before(&self, day: CalendarDay) -> Result<usize, StoreError>;
}

/// Returns the data directory, creating it if needed.
///
/// `STREAKDAY_HOME` overrides the location. Otherwise `~/.config/streakday`,
/// or `~/.config/streakday-dev` when `STREAKDAY_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("STREAKDAY_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("STREAKDAY_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("streakday-dev")
            } else {
                base_dir.join("streakday")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
