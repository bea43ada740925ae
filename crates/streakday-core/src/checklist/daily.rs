//! One calendar day's checklist.

use serde::{Deserialize, Serialize};

use super::task::{LockedTask, Task, TaskTemplate};
use crate::calendar::CalendarDay;
use crate::error::ChecklistError;

/// Outcome of marking a single task done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCompletion {
    Completed,
    AlreadyCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyChecklist {
    pub date: CalendarDay,
    /// Unlocked tasks in display order.
    pub tasks: Vec<Task>,
    /// Tasks that need a longer streak; shown but not completable.
    #[serde(default)]
    pub locked: Vec<LockedTask>,
    /// Streak length the checklist was gated with.
    #[serde(default)]
    pub streak_at_build: u32,
}

impl DailyChecklist {
    /// Generate the checklist for `date`, gating the catalog by `current_streak`.
    pub fn build(date: CalendarDay, catalog: &[TaskTemplate], current_streak: u32) -> Self {
        let (tasks, locked) = catalog
            .iter()
            .partition::<Vec<&TaskTemplate>, _>(|t| t.is_unlocked_at(current_streak));

        Self {
            date,
            tasks: tasks.into_iter().map(Task::from_template).collect(),
            locked: locked.into_iter().map(LockedTask::from).collect(),
            streak_at_build: current_streak,
        }
    }

    /// True iff there is at least one task and every task is done.
    pub fn is_completed(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(|t| t.is_completed)
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_completed).count()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Mark `task_id` done. Completing an already completed task is a no-op.
    ///
    /// # Errors
    /// [`ChecklistError::TaskLocked`] for a task that needs a longer streak,
    /// [`ChecklistError::UnknownTask`] for an id not in this checklist.
    pub fn complete_task(&mut self, task_id: &str) -> Result<TaskCompletion, ChecklistError> {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
            if task.is_completed {
                return Ok(TaskCompletion::AlreadyCompleted);
            }
            task.is_completed = true;
            return Ok(TaskCompletion::Completed);
        }

        match self.locked.iter().find(|t| t.id == task_id) {
            Some(locked) => Err(ChecklistError::TaskLocked {
                task_id: task_id.to_string(),
                unlocks_at: locked.minimum_streak_day,
                current_streak: self.streak_at_build,
            }),
            None => Err(ChecklistError::UnknownTask(task_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<TaskTemplate> {
        vec![
            TaskTemplate::new("verse", "Read", 0),
            TaskTemplate::new("pray", "Pray", 0),
            TaskTemplate::new("memorize", "Memorize", 7),
        ]
    }

    fn today() -> CalendarDay {
        CalendarDay::new(2026, 6, 1).unwrap()
    }

    #[test]
    fn build_gates_by_streak() {
        let list = DailyChecklist::build(today(), &catalog(), 2);
        let ids: Vec<_> = list.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["verse", "pray"]);
        assert_eq!(list.locked.len(), 1);
        assert_eq!(list.locked[0].id, "memorize");

        let list = DailyChecklist::build(today(), &catalog(), 7);
        assert_eq!(list.tasks.len(), 3);
        assert!(list.locked.is_empty());
    }

    #[test]
    fn unlocked_tasks_are_completable() {
        let mut list = DailyChecklist::build(today(), &catalog(), 0);
        assert_eq!(list.complete_task("verse").unwrap(), TaskCompletion::Completed);
        assert!(list.task("verse").unwrap().is_completed);
        assert!(!list.is_completed());
    }

    #[test]
    fn locked_tasks_are_not_completable() {
        let mut list = DailyChecklist::build(today(), &catalog(), 3);
        let err = list.complete_task("memorize").unwrap_err();
        assert_eq!(
            err,
            ChecklistError::TaskLocked {
                task_id: "memorize".into(),
                unlocks_at: 7,
                current_streak: 3,
            }
        );
    }

    #[test]
    fn unknown_task_is_an_error() {
        let mut list = DailyChecklist::build(today(), &catalog(), 0);
        assert_eq!(
            list.complete_task("nope").unwrap_err(),
            ChecklistError::UnknownTask("nope".into())
        );
    }

    #[test]
    fn completion_requires_every_task() {
        let mut list = DailyChecklist::build(today(), &catalog(), 0);
        list.complete_task("verse").unwrap();
        assert_eq!(list.completed_count(), 1);
        list.complete_task("pray").unwrap();
        assert!(list.is_completed());
        assert_eq!(
            list.complete_task("pray").unwrap(),
            TaskCompletion::AlreadyCompleted
        );
    }

    #[test]
    fn empty_checklist_is_never_complete() {
        let list = DailyChecklist::build(today(), &[], 0);
        assert!(!list.is_completed());
    }
}
