//! Daily checklist: today's tasks, unlocked progressively by streak length.

mod daily;
mod task;

pub use daily::{DailyChecklist, TaskCompletion};
pub use task::{default_catalog, validate_catalog, LockedTask, Task, TaskTemplate};
