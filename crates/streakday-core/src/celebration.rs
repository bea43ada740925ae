//! Celebration and badge projections.
//!
//! Computed right after a day is completed, from the stats before and after
//! the update. Nothing here mutates streak state; the only persisted piece is
//! the set of badge thresholds already unlocked.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::streak::StreakStats;

/// Transient celebration payload. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CelebrationData {
    pub streak_number: u32,
    pub is_new_record: bool,
    pub motivational_message: String,
    /// The milestone matched exactly, if any.
    pub milestone: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub streak: u32,
    pub message: String,
}

/// Exact-match lookup from streak length to message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneTable {
    /// Fallback message; `{n}` is replaced with the streak length.
    #[serde(default = "default_generic_message")]
    pub generic_message: String,
    #[serde(default = "default_milestones")]
    pub milestones: Vec<Milestone>,
}

fn default_milestones() -> Vec<Milestone> {
    [
        (1, "Day one. Every great journey begins with a single step."),
        (3, "Three days in a row. A new habit is taking root."),
        (7, "A full week! Seven days of showing up for what matters."),
        (14, "Two weeks strong. Your faithfulness is building something lasting."),
        (30, "30 days! A whole month of daily devotion."),
        (50, "50 days. Steady and unshaken."),
        (100, "100 days! A triple-digit streak is a rare gift."),
        (365, "365 days. A full year, one day at a time."),
    ]
    .into_iter()
    .map(|(streak, message)| Milestone {
        streak,
        message: message.to_string(),
    })
    .collect()
}

fn default_generic_message() -> String {
    "{n}-day streak! Keep going.".to_string()
}

impl Default for MilestoneTable {
    fn default() -> Self {
        Self {
            generic_message: default_generic_message(),
            milestones: default_milestones(),
        }
    }
}

impl MilestoneTable {
    pub fn milestone(&self, streak: u32) -> Option<&str> {
        self.milestones
            .iter()
            .find(|m| m.streak == streak)
            .map(|m| m.message.as_str())
    }

    pub fn message_for(&self, streak: u32) -> String {
        match self.milestone(streak) {
            Some(msg) => msg.to_string(),
            None => self.generic_message.replace("{n}", &streak.to_string()),
        }
    }

    /// Smallest milestone strictly above `streak`.
    pub fn next_milestone(&self, streak: u32) -> Option<u32> {
        self.milestones
            .iter()
            .map(|m| m.streak)
            .filter(|&n| n > streak)
            .min()
    }
}

/// Build the celebration for a completed day.
pub fn compute_celebration(
    pre_update: &StreakStats,
    post_update: &StreakStats,
    milestones: &MilestoneTable,
) -> CelebrationData {
    let streak_number = post_update.current_streak;
    CelebrationData {
        streak_number,
        is_new_record: post_update.longest_streak > pre_update.longest_streak,
        motivational_message: milestones.message_for(streak_number),
        milestone: milestones.milestone(streak_number).map(|_| streak_number),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub threshold: u32,
    pub name: String,
}

impl Badge {
    pub fn new(threshold: u32, name: impl Into<String>) -> Self {
        Self {
            threshold,
            name: name.into(),
        }
    }
}

pub fn default_badges() -> Vec<Badge> {
    vec![
        Badge::new(3, "Mustard Seed"),
        Badge::new(7, "Faithful Week"),
        Badge::new(14, "Steadfast"),
        Badge::new(30, "Rooted"),
        Badge::new(60, "Unwavering"),
        Badge::new(100, "Centurion"),
        Badge::new(365, "Year of Grace"),
    ]
}

/// Badge definitions plus the thresholds already reached.
#[derive(Debug, Clone, Default)]
pub struct BadgeBook {
    badges: Vec<Badge>,
    unlocked: BTreeSet<u32>,
}

impl BadgeBook {
    pub fn new(mut badges: Vec<Badge>, unlocked: BTreeSet<u32>) -> Self {
        badges.sort_by_key(|b| b.threshold);
        badges.dedup_by_key(|b| b.threshold);
        Self { badges, unlocked }
    }

    /// Unlock every badge whose threshold `streak` has reached for the first
    /// time. Returns only the newly unlocked badges, lowest first.
    pub fn record(&mut self, streak: u32) -> Vec<Badge> {
        let mut fresh = Vec::new();
        for badge in self.badges.iter().filter(|b| b.threshold <= streak) {
            if self.unlocked.insert(badge.threshold) {
                fresh.push(badge.clone());
            }
        }
        fresh
    }

    pub fn unlocked(&self) -> &BTreeSet<u32> {
        &self.unlocked
    }

    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    pub fn is_unlocked(&self, threshold: u32) -> bool {
        self.unlocked.contains(&threshold)
    }
}
