use chrono::{DateTime, Utc};
use clap::Subcommand;
use streakday_core::{Config, ReminderSettings};

use super::{open_engine, print_json, CmdResult};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// When the next reminder fires
    Next,
    /// Change the reminder time or turn reminders off
    Set {
        #[arg(long)]
        hour: Option<u32>,
        #[arg(long)]
        minute: Option<u32>,
        /// Turn reminders on or off
        #[arg(long)]
        enabled: Option<bool>,
    },
}

pub fn run(action: ReminderAction, now: DateTime<Utc>) -> CmdResult {
    match action {
        ReminderAction::Next => {
            let engine = open_engine()?;
            let next = engine.next_reminder(now)?;
            print_json(&serde_json::json!({
                "settings": engine.reminder_settings()?,
                "next_at": next,
            }))
        }
        ReminderAction::Set {
            hour,
            minute,
            enabled,
        } => {
            let mut config = Config::load()?;
            let current = config.reminders;
            let settings = ReminderSettings {
                enabled: enabled.unwrap_or(current.enabled),
                hour: hour.unwrap_or(current.hour),
                minute: minute.unwrap_or(current.minute),
            };
            settings.validate()?;

            let engine = open_engine()?;
            let next = engine.update_reminders(settings, now)?;
            config.reminders = settings;
            config.save()?;

            print_json(&serde_json::json!({
                "settings": settings,
                "next_at": next,
            }))
        }
    }
}
