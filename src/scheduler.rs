//! Purpose-keyed timers.
//!
//! Each context owns a [`TaskSet`] keyed by an enum of its timer purposes.
//! Scheduling a key that is already scheduled replaces it, so a restart can
//! never leak a second copy of the same timer. Nothing here reads the clock:
//! callers pass `now` to [`TaskSet::take_due`].

use std::collections::BTreeMap;

use crate::time_source::EpochMillis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Task {
    due_at: EpochMillis,
    /// `Some` for repeating tasks.
    every_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct TaskSet<K: Ord + Copy> {
    tasks: BTreeMap<K, Task>,
}

impl<K: Ord + Copy> Default for TaskSet<K> {
    fn default() -> Self {
        Self {
            tasks: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy> TaskSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every `interval_ms`, first at `now + interval_ms`.
    pub fn schedule_every(&mut self, key: K, interval_ms: u64, now: EpochMillis) {
        let interval_ms = interval_ms.max(1);
        self.tasks.insert(
            key,
            Task {
                due_at: now.saturating_add(interval_ms as i64),
                every_ms: Some(interval_ms),
            },
        );
    }

    /// Fire once at `now + delay_ms`.
    pub fn schedule_once(&mut self, key: K, delay_ms: u64, now: EpochMillis) {
        self.tasks.insert(
            key,
            Task {
                due_at: now.saturating_add(delay_ms as i64),
                every_ms: None,
            },
        );
    }

    /// Returns whether the task existed.
    pub fn cancel(&mut self, key: K) -> bool {
        self.tasks.remove(&key).is_some()
    }

    pub fn is_scheduled(&self, key: K) -> bool {
        self.tasks.contains_key(&key)
    }

    pub fn interval_of(&self, key: K) -> Option<u64> {
        self.tasks.get(&key).and_then(|t| t.every_ms)
    }

    /// Earliest pending deadline.
    pub fn next_due(&self) -> Option<EpochMillis> {
        self.tasks.values().map(|t| t.due_at).min()
    }

    /// Remove and return the keys due at `now`, earliest first.
    ///
    /// Repeating tasks are rescheduled at `now + interval`, so a tick that
    /// arrives late fires once rather than catching up.
    pub fn take_due(&mut self, now: EpochMillis) -> Vec<K> {
        let mut due: Vec<(EpochMillis, K)> = self
            .tasks
            .iter()
            .filter(|(_, task)| task.due_at <= now)
            .map(|(key, task)| (task.due_at, *key))
            .collect();
        due.sort_by_key(|(at, _)| *at);

        for (_, key) in &due {
            let Some(task) = self.tasks.get_mut(key) else {
                continue;
            };
            match task.every_ms {
                Some(every) => task.due_at = now.saturating_add(every as i64),
                None => {
                    self.tasks.remove(key);
                }
            }
        }
        due.into_iter().map(|(_, key)| key).collect()
    }
}
