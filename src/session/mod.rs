//! Per-site session accounting.
//!
//! The background owns a [`SessionStore`]: one [`SessionRecord`] per tracked
//! hostname, persisted under `sessions` in the local partition. Foregrounds
//! keep a lighter [`SessionView`] mirror for leveling.

pub mod store;
pub mod view;

use serde::{Deserialize, Serialize};

use crate::time_source::EpochMillis;

pub use store::SessionStore;
pub use view::SessionView;

/// Accumulated attention for one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// First time this site was seen in the current epoch.
    pub start_time: EpochMillis,
    #[serde(alias = "totalTime")]
    pub total_active_time_ms: u64,
    /// Moment up to which `total_active_time_ms` has been credited.
    #[serde(alias = "lastChecked")]
    pub last_checked_timestamp: EpochMillis,
    #[serde(alias = "videosWatched", default)]
    pub videos_watched_count: u64,
}

impl SessionRecord {
    pub fn new(now: EpochMillis) -> Self {
        Self {
            start_time: now,
            total_active_time_ms: 0,
            last_checked_timestamp: now,
            videos_watched_count: 0,
        }
    }

    /// Credit `now - last_checked` and advance the checkpoint.
    ///
    /// A clock that went backwards credits nothing and leaves the checkpoint
    /// where it was. Returns the credited milliseconds.
    pub fn accrue(&mut self, now: EpochMillis) -> u64 {
        let delta = now.saturating_sub(self.last_checked_timestamp);
        if delta <= 0 {
            return 0;
        }
        self.total_active_time_ms = self.total_active_time_ms.saturating_add(delta as u64);
        self.last_checked_timestamp = now;
        delta as u64
    }

    pub fn total_minutes(&self) -> u64 {
        (self.total_active_time_ms as f64 / 60_000.0).round() as u64
    }
}
