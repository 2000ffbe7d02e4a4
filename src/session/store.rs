//! Persisted session map.
//!
//! Every mutation is written through immediately. Write failures are logged
//! and otherwise ignored: the in-memory map stays authoritative for this
//! process and the next successful save carries the state forward.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::SessionRecord;
use crate::constants::{SESSION_EXPIRY_MS, SESSIONS_KEY};
use crate::storage::StorageArea;
use crate::time_source::EpochMillis;

pub struct SessionStore {
    area: Arc<dyn StorageArea>,
    records: BTreeMap<String, SessionRecord>,
}

impl SessionStore {
    /// Empty store over `area`; call [`SessionStore::load`] to read existing records.
    pub fn new(area: Arc<dyn StorageArea>) -> Self {
        Self {
            area,
            records: BTreeMap::new(),
        }
    }

    /// Replace the in-memory map with what is persisted.
    ///
    /// Entries that fail to decode are skipped with a warning.
    pub fn load(&mut self) {
        self.records.clear();
        let stored = match self.area.get(SESSIONS_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                log_warning!("Could not read sessions from {}: {e:#}", self.area.label());
                return;
            }
        };
        let Some(stored) = stored else { return };
        let Value::Object(entries) = stored else {
            log_warning!("Ignoring stored sessions: not an object");
            return;
        };

        for (domain, raw) in entries {
            match serde_json::from_value::<SessionRecord>(raw) {
                Ok(record) => {
                    self.records.insert(domain, record);
                }
                Err(e) => log_warning!("Skipping malformed session for {domain}: {e}"),
            }
        }
    }

    fn persist(&self) {
        let map: Map<String, Value> = self
            .records
            .iter()
            .filter_map(|(domain, record)| {
                serde_json::to_value(record)
                    .ok()
                    .map(|value| (domain.clone(), value))
            })
            .collect();

        if let Err(e) = self.area.set(SESSIONS_KEY, Value::Object(map)) {
            log_warning!("Could not persist sessions to {}: {e:#}", self.area.label());
        }
    }

    pub fn get(&self, domain: &str) -> Option<&SessionRecord> {
        self.records.get(domain)
    }

    pub fn records(&self) -> &BTreeMap<String, SessionRecord> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Existing record, or a fresh one that is persisted immediately.
    pub fn get_or_create(&mut self, domain: &str, now: EpochMillis) -> SessionRecord {
        if let Some(record) = self.records.get(domain) {
            return *record;
        }
        let record = SessionRecord::new(now);
        self.records.insert(domain.to_string(), record);
        log_debug!("Started session for {domain}");
        self.persist();
        record
    }

    /// Credit time since the last checkpoint. Unknown domains are ignored.
    pub fn accrue(&mut self, domain: &str, now: EpochMillis) -> Option<SessionRecord> {
        let record = self.records.get_mut(domain)?;
        record.accrue(now);
        let record = *record;
        self.persist();
        Some(record)
    }

    /// Move the checkpoint to `now` without crediting anything.
    ///
    /// Used when a tab becomes active or the window regains focus so time
    /// spent elsewhere is not counted. Never moves the checkpoint backwards.
    pub fn touch(&mut self, domain: &str, now: EpochMillis) -> Option<SessionRecord> {
        let record = self.records.get_mut(domain)?;
        if now > record.last_checked_timestamp {
            record.last_checked_timestamp = now;
        }
        let record = *record;
        self.persist();
        Some(record)
    }

    /// Store the foreground's absolute video count. Unknown domains are ignored.
    pub fn record_video_watched(&mut self, domain: &str, count: u64) -> Option<SessionRecord> {
        let record = self.records.get_mut(domain)?;
        record.videos_watched_count = count;
        let record = *record;
        self.persist();
        Some(record)
    }

    pub fn reset_all(&mut self) {
        self.records.clear();
        self.persist();
    }

    /// Drop records whose checkpoint is more than a day old.
    ///
    /// Returns the removed domains; persists only when something was removed.
    pub fn sweep_expired(&mut self, now: EpochMillis) -> Vec<String> {
        let cutoff = now.saturating_sub(SESSION_EXPIRY_MS);
        let expired: Vec<String> = self
            .records
            .iter()
            .filter(|(_, record)| record.last_checked_timestamp < cutoff)
            .map(|(domain, _)| domain.clone())
            .collect();

        if !expired.is_empty() {
            for domain in &expired {
                self.records.remove(domain);
            }
            self.persist();
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::*;
    use crate::storage::MemoryArea;
    use serde_json::json;

    fn store() -> (Arc<MemoryArea>, SessionStore) {
        let area = Arc::new(MemoryArea::new("local"));
        let store = SessionStore::new(area.clone());
        (area, store)
    }

    #[test]
    fn test_get_or_create_persists_immediately() {
        let (area, mut store) = store();
        let record = store.get_or_create(TEST_DOMAIN, TEST_EPOCH);

        assert_eq!(record, SessionRecord::new(TEST_EPOCH));
        let stored = area.get(SESSIONS_KEY).unwrap().unwrap();
        assert_eq!(stored[TEST_DOMAIN]["startTime"], json!(TEST_EPOCH));
        assert_eq!(stored[TEST_DOMAIN]["totalActiveTimeMs"], json!(0));
    }

    #[test]
    fn test_get_or_create_returns_existing() {
        let (_, mut store) = store();
        store.get_or_create(TEST_DOMAIN, TEST_EPOCH);
        store.accrue(TEST_DOMAIN, TEST_EPOCH + MINUTE_MS);
        let record = store.get_or_create(TEST_DOMAIN, TEST_EPOCH + HOUR_MS);
        assert_eq!(record.start_time, TEST_EPOCH);
        assert_eq!(record.total_active_time_ms, MINUTE_MS as u64);
    }

    #[test]
    fn test_accrue_same_instant_twice_credits_once() {
        let (_, mut store) = store();
        store.get_or_create(TEST_DOMAIN, TEST_EPOCH);

        let t = TEST_EPOCH + 5_000;
        store.accrue(TEST_DOMAIN, t);
        let record = store.accrue(TEST_DOMAIN, t).unwrap();
        assert_eq!(record.total_active_time_ms, 5_000);
        assert_eq!(record.last_checked_timestamp, t);
    }

    #[test]
    fn test_accrue_unknown_domain_is_noop() {
        let (area, mut store) = store();
        assert_eq!(store.accrue("unknown.example", TEST_EPOCH), None);
        assert!(store.is_empty());
        assert_eq!(area.get(SESSIONS_KEY).unwrap(), None);
    }

    #[test]
    fn test_clock_going_backwards_credits_nothing() {
        let (_, mut store) = store();
        store.get_or_create(TEST_DOMAIN, TEST_EPOCH);
        store.accrue(TEST_DOMAIN, TEST_EPOCH + 10_000);

        let record = store.accrue(TEST_DOMAIN, TEST_EPOCH).unwrap();
        assert_eq!(record.total_active_time_ms, 10_000);
        assert_eq!(record.last_checked_timestamp, TEST_EPOCH + 10_000);
    }

    #[test]
    fn test_touch_skips_time_spent_elsewhere() {
        let (_, mut store) = store();
        store.get_or_create(TEST_DOMAIN, TEST_EPOCH);
        store.touch(TEST_DOMAIN, TEST_EPOCH + HOUR_MS);
        let record = store.accrue(TEST_DOMAIN, TEST_EPOCH + HOUR_MS + 1_000).unwrap();
        assert_eq!(record.total_active_time_ms, 1_000);
    }

    #[test]
    fn test_record_video_watched_overwrites() {
        let (_, mut store) = store();
        assert_eq!(store.record_video_watched(TEST_DOMAIN, 3), None);
        store.get_or_create(TEST_DOMAIN, TEST_EPOCH);
        store.record_video_watched(TEST_DOMAIN, 3);
        let record = store.record_video_watched(TEST_DOMAIN, 2).unwrap();
        assert_eq!(record.videos_watched_count, 2);
    }

    #[test]
    fn test_sweep_expired_boundary() {
        let (_, mut store) = store();
        let now = TEST_EPOCH + 48 * HOUR_MS;
        store.get_or_create("old.youtube.com", now - 25 * HOUR_MS);
        store.get_or_create("recent.youtube.com", now - 23 * HOUR_MS);
        store.get_or_create("edge.youtube.com", now - 24 * HOUR_MS);

        let removed = store.sweep_expired(now);
        assert_eq!(removed, vec!["old.youtube.com".to_string()]);
        assert!(store.get("recent.youtube.com").is_some());
        assert!(store.get("edge.youtube.com").is_some());
    }

    #[test]
    fn test_sweep_without_changes_does_not_write() {
        let (area, mut store) = store();
        store.get_or_create(TEST_DOMAIN, TEST_EPOCH);
        area.remove(SESSIONS_KEY).unwrap();

        assert!(store.sweep_expired(TEST_EPOCH + HOUR_MS).is_empty());
        assert_eq!(area.get(SESSIONS_KEY).unwrap(), None);
    }

    #[test]
    fn test_reset_all_then_fresh_record() {
        let (area, mut store) = store();
        store.get_or_create(TEST_DOMAIN, TEST_EPOCH);
        store.accrue(TEST_DOMAIN, TEST_EPOCH + HOUR_MS);

        store.reset_all();
        assert!(store.is_empty());
        assert_eq!(area.get(SESSIONS_KEY).unwrap(), Some(json!({})));

        let record = store.get_or_create(TEST_DOMAIN, TEST_EPOCH + 2 * HOUR_MS);
        assert_eq!(record.total_active_time_ms, 0);
    }

    #[test]
    fn test_load_reads_legacy_field_names_and_skips_garbage() {
        let (area, mut store) = store();
        area.set(
            SESSIONS_KEY,
            json!({
                "www.youtube.com": {
                    "startTime": TEST_EPOCH,
                    "totalTime": 120000,
                    "lastChecked": TEST_EPOCH + 120000,
                    "videosWatched": 4
                },
                "broken.youtube.com": "garbage"
            }),
        )
        .unwrap();

        store.load();
        assert_eq!(store.len(), 1);
        let record = store.get(TEST_DOMAIN).unwrap();
        assert_eq!(record.total_active_time_ms, 120_000);
        assert_eq!(record.videos_watched_count, 4);
        assert_eq!(record.total_minutes(), 2);
    }
}
