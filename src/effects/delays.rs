//! Interaction delays.
//!
//! Matching elements are wrapped once; the delay in force at wrap time sticks
//! to the element. A click on a wrapped element is deferred and marked busy,
//! then re-dispatched straight to the surface when due, so the synthetic
//! click never passes through interception again.

use std::collections::BTreeMap;

use super::ElementId;
use crate::time_source::EpochMillis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickDecision {
    /// Not wrapped: the click proceeds immediately.
    PassThrough,
    /// Held back until `fire_at`.
    Deferred { fire_at: EpochMillis },
}

#[derive(Debug, Clone, Default)]
pub struct DelayRegistry {
    wrapped: BTreeMap<ElementId, u64>,
    pending: Vec<(EpochMillis, ElementId)>,
}

impl DelayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap elements not seen before. Returns how many were newly wrapped.
    pub fn wrap(&mut self, targets: &[ElementId], delay_ms: u64) -> usize {
        let mut added = 0;
        for element in targets {
            if !self.wrapped.contains_key(element) {
                self.wrapped.insert(*element, delay_ms);
                added += 1;
            }
        }
        added
    }

    pub fn is_wrapped(&self, element: ElementId) -> bool {
        self.wrapped.contains_key(&element)
    }

    pub fn delay_of(&self, element: ElementId) -> Option<u64> {
        self.wrapped.get(&element).copied()
    }

    /// Decide what happens to a user click.
    pub fn intercept(&mut self, element: ElementId, now: EpochMillis) -> ClickDecision {
        let Some(delay_ms) = self.delay_of(element) else {
            return ClickDecision::PassThrough;
        };
        let fire_at = now.saturating_add(delay_ms as i64);
        self.pending.push((fire_at, element));
        ClickDecision::Deferred { fire_at }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn next_due(&self) -> Option<EpochMillis> {
        self.pending.iter().map(|(at, _)| *at).min()
    }

    /// Deferred clicks due at `now`, in deadline order.
    pub fn take_due(&mut self, now: EpochMillis) -> Vec<ElementId> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|(at, _)| *at <= now);
        self.pending = rest;
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, element)| element).collect()
    }

    /// Forget every wrapping. Clicks already deferred still complete.
    pub fn reset(&mut self) {
        self.wrapped.clear();
    }

    pub fn wrapped_count(&self) -> usize {
        self.wrapped.len()
    }
}
