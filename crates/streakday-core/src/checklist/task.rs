use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Catalog entry from which each day's tasks are generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: String,
    pub title: String,
    /// Streak length at or above which the task is unlocked.
    #[serde(default)]
    pub minimum_streak_day: u32,
}

impl TaskTemplate {
    pub fn new(id: impl Into<String>, title: impl Into<String>, minimum_streak_day: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            minimum_streak_day,
        }
    }

    /// Whether a streak of `streak` days is long enough for this task.
    pub fn is_unlocked_at(&self, streak: u32) -> bool {
        self.minimum_streak_day <= streak
    }
}

/// A completable task in today's checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub minimum_streak_day: u32,
    #[serde(default)]
    pub is_completed: bool,
}

impl Task {
    pub fn from_template(template: &TaskTemplate) -> Self {
        Self {
            id: template.id.clone(),
            title: template.title.clone(),
            minimum_streak_day: template.minimum_streak_day,
            is_completed: false,
        }
    }
}

/// Preview of a task that is not yet unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedTask {
    pub id: String,
    pub title: String,
    pub minimum_streak_day: u32,
}

impl From<&TaskTemplate> for LockedTask {
    fn from(template: &TaskTemplate) -> Self {
        Self {
            id: template.id.clone(),
            title: template.title.clone(),
            minimum_streak_day: template.minimum_streak_day,
        }
    }
}

/// The built-in daily devotional routine.
pub fn default_catalog() -> Vec<TaskTemplate> {
    vec![
        TaskTemplate::new("read-verse", "Read today's verse", 0),
        TaskTemplate::new("speak-affirmation", "Speak today's affirmation aloud", 0),
        TaskTemplate::new("gratitude", "Write down one thing you are grateful for", 0),
        TaskTemplate::new("pray-for-someone", "Pray for someone by name", 3),
        TaskTemplate::new("memorize-verse", "Memorize a short verse", 7),
        TaskTemplate::new("share-encouragement", "Send someone an encouraging word", 14),
        TaskTemplate::new("quiet-reflection", "Spend ten minutes in quiet reflection", 30),
    ]
}

/// Reject catalogs that could never produce a completable checklist.
pub fn validate_catalog(catalog: &[TaskTemplate]) -> Result<(), ValidationError> {
    if catalog.is_empty() {
        return Err(ValidationError::EmptyCollection("checklist.tasks".to_string()));
    }
    if !catalog.iter().any(|t| t.minimum_streak_day == 0) {
        return Err(ValidationError::InvalidValue {
            field: "checklist.tasks".to_string(),
            message: "at least one task must be available with no streak".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for template in catalog {
        if template.id.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "checklist.tasks.id".to_string(),
                message: "task id must not be empty".to_string(),
            });
        }
        if !seen.insert(template.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                collection: "checklist.tasks".to_string(),
                id: template.id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_is_valid() {
        validate_catalog(&default_catalog()).unwrap();
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let catalog = vec![
            TaskTemplate::new("a", "First", 0),
            TaskTemplate::new("a", "Again", 2),
        ];
        assert!(matches!(
            validate_catalog(&catalog),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn catalog_needs_an_entry_level_task() {
        assert!(validate_catalog(&[]).is_err());
        assert!(validate_catalog(&[TaskTemplate::new("late", "Later", 5)]).is_err());
    }

    #[test]
    fn unlock_is_inclusive() {
        let template = TaskTemplate::new("x", "X", 3);
        assert!(!template.is_unlocked_at(2));
        assert!(template.is_unlocked_at(3));
    }
}
