use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "streakday", version, about = "Streakday CLI")]
struct Cli {
    /// Act as if the current time were this RFC 3339 instant
    #[arg(long, global = true)]
    at: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's checklist
    Today,
    /// Mark a task of today's checklist as done
    Complete {
        /// Task id (see `streakday today`)
        task_id: String,
    },
    /// Streak statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Badge progress
    Badges,
    /// Daily reminder time
    Reminder {
        #[command(subcommand)]
        action: commands::reminder::ReminderAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("STREAKDAY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = commands::parse_now(cli.at.as_deref()).and_then(|now| match cli.command {
        Commands::Today => commands::checklist::today(now),
        Commands::Complete { task_id } => commands::checklist::complete(&task_id, now),
        Commands::Stats { action } => commands::stats::run(action, now),
        Commands::Badges => commands::stats::badges(),
        Commands::Reminder { action } => commands::reminder::run(action, now),
        Commands::Config { action } => commands::config::run(action),
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
