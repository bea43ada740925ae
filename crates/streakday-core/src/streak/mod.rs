mod stats;
mod tracker;

pub use stats::{DayTransition, StreakStats};
pub use tracker::{StreakTracker, StreakUpdate};
