//! Foreground mirror of one session record.

use super::SessionRecord;
use crate::time_source::EpochMillis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionView {
    /// When this page instance loaded; reset on in-app navigation.
    pub page_load_time: EpochMillis,
    pub total_active_time_ms: u64,
    pub videos_watched_count: u64,
}

impl SessionView {
    pub fn new(page_load_time: EpochMillis) -> Self {
        Self {
            page_load_time,
            total_active_time_ms: 0,
            videos_watched_count: 0,
        }
    }

    /// Copy the persisted totals; the page-load anchor is kept.
    pub fn sync(&mut self, record: &SessionRecord) {
        self.total_active_time_ms = record.total_active_time_ms;
        self.videos_watched_count = record.videos_watched_count;
    }

    pub fn reset_page_load(&mut self, now: EpochMillis) {
        self.page_load_time = now;
    }

    /// Forget all accrued totals (after a reset-all).
    pub fn clear(&mut self, now: EpochMillis) {
        *self = SessionView::new(now);
    }

    /// Current-page dwell plus everything previously accrued for the site.
    pub fn elapsed_ms(&self, now: EpochMillis) -> u64 {
        let dwell = now.saturating_sub(self.page_load_time).max(0) as u64;
        dwell.saturating_add(self.total_active_time_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::*;

    #[test]
    fn test_elapsed_combines_dwell_and_total() {
        let mut view = SessionView::new(TEST_EPOCH);
        let mut record = SessionRecord::new(TEST_EPOCH - HOUR_MS);
        record.total_active_time_ms = 10 * MINUTE_MS as u64;
        view.sync(&record);

        assert_eq!(view.elapsed_ms(TEST_EPOCH + 2 * MINUTE_MS), 12 * MINUTE_MS as u64);
    }

    #[test]
    fn test_elapsed_never_negative() {
        let view = SessionView::new(TEST_EPOCH);
        assert_eq!(view.elapsed_ms(TEST_EPOCH - MINUTE_MS), 0);
    }

    #[test]
    fn test_reset_page_load_keeps_totals() {
        let mut view = SessionView::new(TEST_EPOCH);
        view.total_active_time_ms = 1_000;
        view.reset_page_load(TEST_EPOCH + HOUR_MS);
        assert_eq!(view.elapsed_ms(TEST_EPOCH + HOUR_MS), 1_000);

        view.clear(TEST_EPOCH + HOUR_MS);
        assert_eq!(view.elapsed_ms(TEST_EPOCH + HOUR_MS), 0);
    }
}
