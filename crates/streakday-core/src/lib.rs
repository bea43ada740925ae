//! # Streakday Core Library
//!
//! This library provides the core logic for Streakday, a daily devotional
//! routine tracker. It counts consecutive calendar days on which the daily
//! checklist was completed, gates tasks by streak length, and derives
//! celebrations and badges from each completed day. The `streakday` CLI is a
//! thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Calendar**: normalization of instants into calendar days in one zone
//! - **Streak Tracker**: a day-transition state machine over [`StreakStats`]
//! - **Checklist**: today's tasks, unlocked progressively by streak length
//! - **Celebration**: pure milestone/record projections and badge unlocks
//! - **Storage**: SQLite persistence and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`StreakEngine`]: Explicitly constructed context tying everything together
//! - [`StreakTracker`]: Serialized, persisted streak counters
//! - [`Database`]: SQLite implementation of [`StreakStore`]
//! - [`Config`]: Application configuration management
//! - [`EventBus`]: Observer list for state-change [`Event`]s

pub mod calendar;
pub mod celebration;
pub mod checklist;
pub mod engine;
pub mod error;
pub mod events;
pub mod reminder;
pub mod storage;
pub mod streak;

pub use calendar::{CalendarDay, DayZone};
pub use celebration::{compute_celebration, Badge, BadgeBook, CelebrationData, Milestone, MilestoneTable};
pub use checklist::{DailyChecklist, LockedTask, Task, TaskCompletion, TaskTemplate};
pub use engine::{CompletionOutcome, StreakEngine};
pub use error::{ChecklistError, ConfigError, CoreError, StoreError, StreakError, ValidationError};
pub use events::{Event, EventBus, SubscriptionId};
pub use reminder::{next_reminder, ReminderSettings};
pub use storage::{Config, Database, MemoryStore, StreakStore};
pub use streak::{DayTransition, StreakStats, StreakTracker, StreakUpdate};
