//! SQLite-based persistence.
//!
//! Provides persistent storage for:
//! - Streak counters (a single row, written in one statement)
//! - Unlocked badge thresholds
//! - Each day's checklist (JSON body keyed by ISO date)
//! - Key-value store (schema version)

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};

use super::{data_dir, StreakStore};
use crate::calendar::CalendarDay;
use crate::checklist::DailyChecklist;
use crate::error::StoreError;
use crate::streak::StreakStats;

const SCHEMA_VERSION: &str = "1";

/// SQLite database for streak storage.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `<data_dir>/streakday.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::open_at(&dir.join("streakday.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS streak_stats (
                id                   INTEGER PRIMARY KEY CHECK (id = 1),
                current_streak       INTEGER NOT NULL,
                longest_streak       INTEGER NOT NULL,
                total_days_completed INTEGER NOT NULL,
                last_completed_date  TEXT
            );

            CREATE TABLE IF NOT EXISTS badges (
                threshold INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS checklists (
                day  TEXT PRIMARY KEY,
                body TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;

        match self.kv_get("schema_version")?.as_deref() {
            Some(SCHEMA_VERSION) => {}
            Some(other) => {
                return Err(StoreError::Unavailable(format!(
                    "database schema version {other} is not supported (expected {SCHEMA_VERSION})"
                )))
            }
            None => self.kv_set("schema_version", SCHEMA_VERSION)?,
        }
        Ok(())
    }

    fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn parse_day(raw: &str, record: &str) -> Result<CalendarDay, StoreError> {
    raw.parse().map_err(|e| StoreError::Corrupt {
        record: record.to_string(),
        message: format!("{e}"),
    })
}

fn to_counter(value: i64, field: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt {
        record: "streak_stats".to_string(),
        message: format!("{field} out of range: {value}"),
    })
}

impl StreakStore for Database {
    fn load_stats(&self) -> Result<Option<StreakStats>, StoreError> {
        let conn = self.conn()?;
        let result = conn.query_row(
            "SELECT current_streak, longest_streak, total_days_completed, last_completed_date
             FROM streak_stats WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        );

        let (current, longest, total, last) = match result {
            Ok(row) => row,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(StreakStats {
            current_streak: to_counter(current, "current_streak")?,
            longest_streak: to_counter(longest, "longest_streak")?,
            total_days_completed: to_counter(total, "total_days_completed")?,
            last_completed_date: last
                .as_deref()
                .map(|raw| parse_day(raw, "streak_stats"))
                .transpose()?,
        }))
    }

    fn save_stats(&self, stats: &StreakStats) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO streak_stats
                (id, current_streak, longest_streak, total_days_completed, last_completed_date)
             VALUES (1, ?1, ?2, ?3, ?4)",
            params![
                stats.current_streak,
                stats.longest_streak,
                stats.total_days_completed,
                stats.last_completed_date.map(|d| d.to_string()),
            ],
        )?;
        Ok(())
    }

    fn load_badges(&self) -> Result<BTreeSet<u32>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT threshold FROM badges")?;
        let rows = stmt.query_map([], |row| row.get::<_, u32>(0))?;

        let mut badges = BTreeSet::new();
        for row in rows {
            badges.insert(row?);
        }
        Ok(badges)
    }

    fn save_badges(&self, badges: &BTreeSet<u32>) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM badges", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO badges (threshold) VALUES (?1)")?;
            for threshold in badges {
                stmt.execute(params![threshold])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_checklist(&self, day: CalendarDay) -> Result<Option<DailyChecklist>, StoreError> {
        let conn = self.conn()?;
        let result = conn.query_row(
            "SELECT body FROM checklists WHERE day = ?1",
            params![day.to_string()],
            |row| row.get::<_, String>(0),
        );
        let body = match result {
            Ok(body) => body,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                record: format!("checklist {day}"),
                message: e.to_string(),
            })
    }

    fn save_checklist(&self, checklist: &DailyChecklist) -> Result<(), StoreError> {
        let body = serde_json::to_string(checklist)?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO checklists (day, body) VALUES (?1, ?2)",
            params![checklist.date.to_string(), body],
        )?;
        Ok(())
    }

    fn prune_checklists_before(&self, day: CalendarDay) -> Result<usize, StoreError> {
        let removed = self.conn()?.execute(
            "DELETE FROM checklists WHERE day < ?1",
            params![day.to_string()],
        )?;
        Ok(removed)
    }
}
