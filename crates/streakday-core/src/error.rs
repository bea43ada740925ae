//! Core error types for streakday-core.
//!
//! This module defines the error hierarchy using thiserror. Each concern
//! (storage, configuration, streak updates, checklist operations) has its own
//! enum, and [`CoreError`] wraps all of them for callers that do not care.

use std::path::PathBuf;
use thiserror::Error;

use crate::calendar::CalendarDay;
use crate::streak::StreakUpdate;

/// Core error type for streakday-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage backend errors
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Streak update errors
    #[error("Streak error: {0}")]
    Streak(#[from] StreakError),

    /// Checklist errors
    #[error("Checklist error: {0}")]
    Checklist(#[from] ChecklistError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A mutex guarding engine state was poisoned by a panicking thread
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Persistence backend errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A stored record could not be decoded
    #[error("Corrupt {record} record: {message}")]
    Corrupt { record: String, message: String },

    /// Record encoding failed
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend cannot be reached at all
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Duplicate identifier in a collection that requires unique ids
    #[error("Duplicate {collection} id: {id}")]
    DuplicateId { collection: String, id: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors returned by [`crate::StreakTracker::update_streak`].
#[derive(Error, Debug)]
pub enum StreakError {
    /// The completion day precedes the last recorded day. State is unchanged
    /// and callers may ignore this (clock skew, backdated event).
    #[error("Completion for {day} is older than last completed day {last_completed}")]
    StaleCompletion {
        day: CalendarDay,
        last_completed: CalendarDay,
    },

    /// In-memory counters were updated but the write failed. The update is
    /// kept; the next successful write reconciles storage.
    #[error("Streak updated in memory but not persisted: {source}")]
    Persistence {
        update: Box<StreakUpdate>,
        #[source]
        source: StoreError,
    },

    /// The tracker's lock was poisoned
    #[error("Streak state lock poisoned")]
    LockPoisoned,
}

/// Errors returned by checklist operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChecklistError {
    /// No task with this id in today's checklist
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// The task exists but is not unlocked at the current streak length
    #[error("Task '{task_id}' unlocks at a {unlocks_at}-day streak (current: {current_streak})")]
    TaskLocked {
        task_id: String,
        unlocks_at: u32,
        current_streak: u32,
    },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
