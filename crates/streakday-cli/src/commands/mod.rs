pub mod checklist;
pub mod config;
pub mod reminder;
pub mod stats;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use streakday_core::{Config, Database, StreakEngine};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Open the engine over the on-disk database and config.
pub fn open_engine() -> Result<StreakEngine, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    Ok(StreakEngine::new(Arc::new(db), &config)?)
}

pub fn parse_now(at: Option<&str>) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    match at {
        Some(raw) => Ok(DateTime::parse_from_rfc3339(raw)
            .map_err(|e| format!("invalid --at '{raw}': {e}"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
