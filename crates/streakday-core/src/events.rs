use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarDay;
use crate::celebration::{Badge, CelebrationData};
use crate::reminder::ReminderSettings;
use crate::streak::{DayTransition, StreakStats};

/// Every state change in the engine produces an Event.
/// Front ends subscribe to them instead of polling state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TaskCompleted {
        day: CalendarDay,
        task_id: String,
        completed: usize,
        total: usize,
        at: DateTime<Utc>,
    },
    /// Every unlocked task of the day is done.
    ChecklistCompleted {
        day: CalendarDay,
        at: DateTime<Utc>,
    },
    StreakUpdated {
        day: CalendarDay,
        transition: DayTransition,
        stats: StreakStats,
        at: DateTime<Utc>,
    },
    /// A completion older than the last recorded day was dropped.
    StaleCompletionIgnored {
        day: CalendarDay,
        last_completed: CalendarDay,
        at: DateTime<Utc>,
    },
    CelebrationTriggered {
        celebration: CelebrationData,
        at: DateTime<Utc>,
    },
    BadgeUnlocked {
        badge: Badge,
        at: DateTime<Utc>,
    },
    /// A write failed; in-memory state is ahead of storage.
    PersistenceFailed {
        record: String,
        message: String,
        at: DateTime<Utc>,
    },
    /// Reminder settings changed; the notification scheduler should reschedule.
    RemindersRescheduled {
        settings: ReminderSettings,
        next_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TaskCompleted { at, .. }
            | Event::ChecklistCompleted { at, .. }
            | Event::StreakUpdated { at, .. }
            | Event::StaleCompletionIgnored { at, .. }
            | Event::CelebrationTriggered { at, .. }
            | Event::BadgeUnlocked { at, .. }
            | Event::PersistenceFailed { at, .. }
            | Event::RemindersRescheduled { at, .. } => *at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

/// Synchronous observer list.
///
/// Subscribers run on the publishing thread, in subscription order. The
/// subscriber list is cloned before dispatch so a callback may subscribe or
/// unsubscribe without deadlocking.
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<(SubscriptionId, Callback)>>,
    next_id: Mutex<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = {
            let mut next = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
            *next += 1;
            SubscriptionId(*next)
        };
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(callback)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        let before = subs.len();
        subs.retain(|(sub_id, _)| *sub_id != id);
        subs.len() != before
    }

    pub fn publish(&self, event: &Event) {
        let subs: Vec<Callback> = self
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in subs {
            callback(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .map(|subs| subs.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Event {
        Event::ChecklistCompleted {
            day: CalendarDay::new(2026, 1, 1).unwrap(),
            at: Utc::now(),
        }
    }

    #[test]
    fn subscribers_receive_events_in_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = seen.clone();
        bus.subscribe(move |_| log.lock().unwrap().push("first"));
        let log = seen.clone();
        bus.subscribe(move |_| log.lock().unwrap().push("second"));

        bus.publish(&sample());
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        let id = bus.subscribe(move |_| *c.lock().unwrap() += 1);

        bus.publish(&sample());
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&sample());

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["type"], "checklist_completed");
        assert_eq!(json["day"], "2026-01-01");
    }
}
