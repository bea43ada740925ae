//! The streak engine context.
//!
//! Wires the store, the tracker, today's checklist, the celebration tables and
//! the event bus together. Constructed explicitly and passed to whoever needs
//! it; there is no process-wide instance.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calendar::{CalendarDay, DayZone};
use crate::celebration::{compute_celebration, Badge, BadgeBook, CelebrationData, MilestoneTable};
use crate::checklist::{DailyChecklist, TaskCompletion, TaskTemplate};
use crate::error::{CoreError, StreakError};
use crate::events::{Event, EventBus};
use crate::reminder::{next_reminder, ReminderSettings};
use crate::storage::{Config, StreakStore};
use crate::streak::{StreakStats, StreakTracker, StreakUpdate};

/// Everything that happened as a result of one `complete_task` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub day: CalendarDay,
    pub task_id: String,
    pub task: TaskCompletion,
    /// Whether today's checklist is complete after this call.
    pub checklist_completed: bool,
    /// Set only on the call that completed the checklist.
    pub streak: Option<StreakUpdate>,
    pub celebration: Option<CelebrationData>,
    pub badges_unlocked: Vec<Badge>,
    /// False if any write during this call failed.
    pub persisted: bool,
}

pub struct StreakEngine {
    store: Arc<dyn StreakStore>,
    tracker: StreakTracker,
    zone: DayZone,
    catalog: Vec<TaskTemplate>,
    milestones: MilestoneTable,
    badges: Mutex<BadgeBook>,
    today: Mutex<Option<DailyChecklist>>,
    reminders: Mutex<ReminderSettings>,
    events: EventBus,
}

fn poisoned<T>(what: &str) -> impl FnOnce(T) -> CoreError + '_ {
    move |_| CoreError::LockPoisoned(what.to_string())
}

impl StreakEngine {
    /// Build an engine over `store` using `config`.
    ///
    /// # Errors
    /// Returns a validation error if the configuration is unusable. Unreadable
    /// stored state is not an error; it falls back to defaults.
    pub fn new(store: Arc<dyn StreakStore>, config: &Config) -> Result<Self, CoreError> {
        config.validate()?;
        let zone = config.day_zone()?;

        let tracker = StreakTracker::load(Arc::clone(&store));
        let unlocked = store.load_badges().unwrap_or_else(|e| {
            warn!(error = %e, "unreadable badge state, starting empty");
            BTreeSet::new()
        });

        Ok(Self {
            tracker,
            zone,
            catalog: config.checklist.tasks.clone(),
            milestones: config.celebration.clone(),
            badges: Mutex::new(BadgeBook::new(config.badges.thresholds.clone(), unlocked)),
            today: Mutex::new(None),
            reminders: Mutex::new(config.reminders),
            events: EventBus::new(),
            store,
        })
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn zone(&self) -> DayZone {
        self.zone
    }

    pub fn milestones(&self) -> &MilestoneTable {
        &self.milestones
    }

    /// Consistent snapshot of the streak counters.
    pub fn stats(&self) -> Result<StreakStats, CoreError> {
        Ok(self.tracker.snapshot()?)
    }

    pub fn badges(&self) -> Result<BadgeBook, CoreError> {
        Ok(self.badges.lock().map_err(poisoned("badges"))?.clone())
    }

    /// Today's checklist as of `now`, generated on first access each day.
    pub fn checklist(&self, now: DateTime<Utc>) -> Result<DailyChecklist, CoreError> {
        let day = self.zone.day_of(now);
        let mut slot = self.lock_today()?;
        let mut pending = Vec::new();
        let checklist = match slot.take() {
            Some(list) if list.date == day => list,
            _ => self.load_or_build(day, now, &mut pending)?,
        };
        *slot = Some(checklist.clone());
        drop(slot);

        self.publish_all(&pending);
        Ok(checklist)
    }

    /// Mark a task of today's checklist done.
    ///
    /// When this call flips the checklist to complete, the streak is updated
    /// exactly once and a celebration (plus any badge unlocks) is computed.
    /// Calls that change nothing never touch the streak.
    ///
    /// # Errors
    /// Returns [`CoreError::Checklist`] for an unknown or locked task.
    /// Persistence failures are logged and reported via
    /// [`CompletionOutcome::persisted`] instead.
    pub fn complete_task(
        &self,
        task_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, CoreError> {
        let day = self.zone.day_of(now);
        let mut pending = Vec::new();

        let result = {
            let mut slot = self.lock_today()?;
            let mut checklist = match slot.take() {
                Some(list) if list.date == day => list,
                _ => self.load_or_build(day, now, &mut pending)?,
            };
            let result = self.apply_completion(&mut checklist, task_id, now, &mut pending);
            *slot = Some(checklist);
            result
        };

        self.publish_all(&pending);
        result
    }

    fn apply_completion(
        &self,
        checklist: &mut DailyChecklist,
        task_id: &str,
        now: DateTime<Utc>,
        pending: &mut Vec<Event>,
    ) -> Result<CompletionOutcome, CoreError> {
        let day = checklist.date;
        let was_complete = checklist.is_completed();
        let task = checklist.complete_task(task_id)?;

        let mut outcome = CompletionOutcome {
            day,
            task_id: task_id.to_string(),
            task,
            checklist_completed: checklist.is_completed(),
            streak: None,
            celebration: None,
            badges_unlocked: Vec::new(),
            persisted: true,
        };

        if task == TaskCompletion::AlreadyCompleted {
            debug!(%day, task_id, "task already completed");
            return Ok(outcome);
        }

        outcome.persisted &= self.persist_checklist(checklist, now, pending);
        pending.push(Event::TaskCompleted {
            day,
            task_id: task_id.to_string(),
            completed: checklist.completed_count(),
            total: checklist.tasks.len(),
            at: now,
        });

        if was_complete || !checklist.is_completed() {
            return Ok(outcome);
        }

        pending.push(Event::ChecklistCompleted { day, at: now });

        let update = match self.tracker.update_streak(day) {
            Ok(update) => update,
            Err(StreakError::Persistence { update, source }) => {
                warn!(%day, error = %source, "streak stats not persisted");
                outcome.persisted = false;
                pending.push(Event::PersistenceFailed {
                    record: "streak_stats".to_string(),
                    message: source.to_string(),
                    at: now,
                });
                *update
            }
            Err(StreakError::StaleCompletion {
                day,
                last_completed,
            }) => {
                info!(%day, %last_completed, "ignoring completion older than last recorded day");
                pending.push(Event::StaleCompletionIgnored {
                    day,
                    last_completed,
                    at: now,
                });
                return Ok(outcome);
            }
            Err(e @ StreakError::LockPoisoned) => return Err(e.into()),
        };

        outcome.streak = Some(update);
        pending.push(Event::StreakUpdated {
            day,
            transition: update.transition,
            stats: update.after,
            at: now,
        });

        if !update.is_new_day() {
            return Ok(outcome);
        }

        let celebration = compute_celebration(&update.before, &update.after, &self.milestones);
        info!(
            streak = celebration.streak_number,
            new_record = celebration.is_new_record,
            milestone = ?celebration.milestone,
            "day completed"
        );
        pending.push(Event::CelebrationTriggered {
            celebration: celebration.clone(),
            at: now,
        });
        outcome.celebration = Some(celebration);

        let fresh = {
            let mut book = self.badges.lock().map_err(poisoned("badges"))?;
            let fresh = book.record(update.after.current_streak);
            if !fresh.is_empty() {
                if let Err(e) = self.store.save_badges(book.unlocked()) {
                    warn!(error = %e, "badge state not persisted");
                    outcome.persisted = false;
                    pending.push(Event::PersistenceFailed {
                        record: "badges".to_string(),
                        message: e.to_string(),
                        at: now,
                    });
                }
            }
            fresh
        };
        for badge in &fresh {
            info!(threshold = badge.threshold, name = %badge.name, "badge unlocked");
            pending.push(Event::BadgeUnlocked {
                badge: badge.clone(),
                at: now,
            });
        }
        outcome.badges_unlocked = fresh;

        Ok(outcome)
    }

    fn load_or_build(
        &self,
        day: CalendarDay,
        now: DateTime<Utc>,
        pending: &mut Vec<Event>,
    ) -> Result<DailyChecklist, CoreError> {
        match self.store.load_checklist(day) {
            Ok(Some(list)) => return Ok(list),
            Ok(None) => {}
            Err(e) => warn!(%day, error = %e, "stored checklist unreadable, rebuilding"),
        }

        let streak = self.tracker.snapshot()?.active_streak(day);
        let list = DailyChecklist::build(day, &self.catalog, streak);
        debug!(
            %day,
            streak,
            unlocked = list.tasks.len(),
            locked = list.locked.len(),
            "built checklist"
        );
        self.persist_checklist(&list, now, pending);

        // Only today's checklist is kept; earlier days live on in the stats.
        match self.store.prune_checklists_before(day) {
            Ok(0) => {}
            Ok(removed) => debug!(%day, removed, "pruned old checklists"),
            Err(e) => warn!(%day, error = %e, "old checklists not pruned"),
        }
        Ok(list)
    }

    fn persist_checklist(
        &self,
        checklist: &DailyChecklist,
        now: DateTime<Utc>,
        pending: &mut Vec<Event>,
    ) -> bool {
        match self.store.save_checklist(checklist) {
            Ok(()) => true,
            Err(e) => {
                warn!(day = %checklist.date, error = %e, "checklist not persisted");
                pending.push(Event::PersistenceFailed {
                    record: format!("checklist {}", checklist.date),
                    message: e.to_string(),
                    at: now,
                });
                false
            }
        }
    }

    pub fn reminder_settings(&self) -> Result<ReminderSettings, CoreError> {
        Ok(*self.reminders.lock().map_err(poisoned("reminders"))?)
    }

    /// Next reminder after `now`, skipping today if it is already complete.
    pub fn next_reminder(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, CoreError> {
        let settings = self.reminder_settings()?;
        let done_today = self.stats()?.completed_on(self.zone.day_of(now));
        Ok(next_reminder(&settings, self.zone, now, done_today))
    }

    /// Replace the reminder settings. Publishes `RemindersRescheduled` when
    /// they actually changed.
    pub fn update_reminders(
        &self,
        settings: ReminderSettings,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, CoreError> {
        settings.validate()?;
        let changed = {
            let mut current = self.reminders.lock().map_err(poisoned("reminders"))?;
            let changed = *current != settings;
            *current = settings;
            changed
        };

        let next_at = self.next_reminder(now)?;
        if changed {
            debug!(?settings, ?next_at, "reminders rescheduled");
            self.events.publish(&Event::RemindersRescheduled {
                settings,
                next_at,
                at: now,
            });
        }
        Ok(next_at)
    }

    /// Zero the streak counters. Explicit user action only.
    pub fn reset_streak(&self) -> Result<(), CoreError> {
        self.tracker.reset()?;
        info!("streak reset");
        Ok(())
    }

    fn lock_today(&self) -> Result<MutexGuard<'_, Option<DailyChecklist>>, CoreError> {
        self.today.lock().map_err(poisoned("checklist"))
    }

    fn publish_all(&self, events: &[Event]) {
        for event in events {
            self.events.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn config() -> Config {
        let mut cfg = Config::default();
        cfg.calendar.utc_offset_minutes = Some(0);
        cfg.checklist.tasks = vec![
            TaskTemplate::new("verse", "Read", 0),
            TaskTemplate::new("pray", "Pray", 0),
            TaskTemplate::new("memorize", "Memorize", 2),
        ];
        cfg
    }

    #[test]
    fn checklist_is_built_once_per_day() {
        let store = Arc::new(MemoryStore::new());
        let engine = StreakEngine::new(store.clone(), &config()).unwrap();

        let first = engine.checklist(at("2026-05-01T08:00:00Z")).unwrap();
        assert_eq!(first.tasks.len(), 2);
        assert_eq!(first.locked.len(), 1);
        engine.complete_task("verse", at("2026-05-01T08:01:00Z")).unwrap();

        let again = engine.checklist(at("2026-05-01T20:00:00Z")).unwrap();
        assert!(again.task("verse").unwrap().is_completed);

        let next_day = engine.checklist(at("2026-05-02T08:00:00Z")).unwrap();
        assert!(!next_day.task("verse").unwrap().is_completed);
    }

    #[test]
    fn building_today_drops_earlier_checklists() {
        let store = Arc::new(MemoryStore::new());
        let engine = StreakEngine::new(store.clone(), &config()).unwrap();
        let yesterday: CalendarDay = "2026-06-01".parse().unwrap();

        engine.checklist(at("2026-06-01T08:00:00Z")).unwrap();
        assert!(store.load_checklist(yesterday).unwrap().is_some());

        let today = engine.checklist(at("2026-06-02T08:00:00Z")).unwrap();
        assert!(store.load_checklist(yesterday).unwrap().is_none());
        assert_eq!(store.load_checklist(today.date).unwrap(), Some(today));
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StreakEngine>();
    }

    #[test]
    fn locked_task_error_reaches_caller() {
        let engine = StreakEngine::new(Arc::new(MemoryStore::new()), &config()).unwrap();
        let err = engine
            .complete_task("memorize", at("2026-05-01T08:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Checklist(_)));
    }

    #[test]
    fn update_reminders_publishes_only_on_change() {
        let engine = StreakEngine::new(Arc::new(MemoryStore::new()), &config()).unwrap();
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        engine.events().subscribe(move |event| {
            if matches!(event, Event::RemindersRescheduled { .. }) {
                *c.lock().unwrap() += 1;
            }
        });

        let now = at("2026-05-01T06:00:00Z");
        let same = engine.reminder_settings().unwrap();
        engine.update_reminders(same, now).unwrap();
        assert_eq!(*count.lock().unwrap(), 0);

        let evening = ReminderSettings {
            hour: 20,
            ..same
        };
        let next = engine.update_reminders(evening, now).unwrap();
        assert_eq!(next, Some(at("2026-05-01T20:00:00Z")));
        assert_eq!(*count.lock().unwrap(), 1);

        let invalid = ReminderSettings {
            minute: 75,
            ..same
        };
        assert!(engine.update_reminders(invalid, now).is_err());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = config();
        cfg.checklist.tasks.clear();
        assert!(StreakEngine::new(Arc::new(MemoryStore::new()), &cfg).is_err());
    }
}
