use chrono::{DateTime, Utc};

use super::{open_engine, print_json, CmdResult};

pub fn today(now: DateTime<Utc>) -> CmdResult {
    let engine = open_engine()?;
    let checklist = engine.checklist(now)?;
    print_json(&serde_json::json!({
        "checklist": checklist,
        "is_completed": checklist.is_completed(),
        "completed": checklist.completed_count(),
        "total": checklist.tasks.len(),
    }))
}

pub fn complete(task_id: &str, now: DateTime<Utc>) -> CmdResult {
    let engine = open_engine()?;
    let outcome = engine.complete_task(task_id, now)?;
    if let Some(celebration) = &outcome.celebration {
        eprintln!("{}", celebration.motivational_message);
    }
    print_json(&outcome)
}
