use chrono::{DateTime, Utc};
use clap::Subcommand;

use super::{open_engine, print_json, CmdResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Current, longest and total day counts
    Show,
    /// Zero the streak counters
    Reset {
        /// Required; resetting cannot be undone
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: StatsAction, now: DateTime<Utc>) -> CmdResult {
    let engine = open_engine()?;

    match action {
        StatsAction::Show => {
            let stats = engine.stats()?;
            let active = stats.active_streak(engine.zone().day_of(now));
            let next = engine.milestones().next_milestone(active);
            print_json(&serde_json::json!({
                "stats": stats,
                "active_streak": active,
                "next_milestone": next,
            }))?;
        }
        StatsAction::Reset { yes } => {
            if !yes {
                return Err("refusing to reset without --yes".into());
            }
            engine.reset_streak()?;
            println!("streak reset");
        }
    }
    Ok(())
}

pub fn badges() -> CmdResult {
    let engine = open_engine()?;
    let book = engine.badges()?;
    let rows: Vec<_> = book
        .badges()
        .iter()
        .map(|b| {
            serde_json::json!({
                "threshold": b.threshold,
                "name": b.name,
                "unlocked": book.is_unlocked(b.threshold),
            })
        })
        .collect();
    print_json(&rows)
}
