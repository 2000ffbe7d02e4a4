//! Time source abstraction for real and simulated clocks.
//!
//! Core components never read the clock: every operation receives `now` as
//! [`EpochMillis`]. Only the outer layers (CLI commands, the simulation
//! driver and the logger's timestamp prefix) consult the process-wide source
//! defined here, which lets `detoxr simulate` fast-forward through hours of
//! viewing in a fraction of a second.

use chrono::{DateTime, Duration as ChronoDuration, Local, TimeZone};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

/// Milliseconds since the Unix epoch.
pub type EpochMillis = i64;

static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Sleep for the duration (or advance simulated time by it).
    fn sleep(&self, duration: StdDuration);

    fn is_simulated(&self) -> bool;

    /// Whether a simulation has reached its end (always false for real time).
    fn is_ended(&self) -> bool {
        false
    }
}

pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Fast-forward clock: `sleep` jumps time instantly, capped at `end_time`.
pub struct SimulatedTimeSource {
    current: Mutex<DateTime<Local>>,
    end_time: DateTime<Local>,
}

impl SimulatedTimeSource {
    pub fn new(start_time: DateTime<Local>, end_time: DateTime<Local>) -> Self {
        Self {
            current: Mutex::new(start_time),
            end_time,
        }
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Local> {
        *self.current.lock().unwrap()
    }

    fn sleep(&self, duration: StdDuration) {
        let mut current = self.current.lock().unwrap();
        let advanced = *current + ChronoDuration::milliseconds(duration.as_millis() as i64);
        *current = advanced.min(self.end_time);
    }

    fn is_simulated(&self) -> bool {
        true
    }

    fn is_ended(&self) -> bool {
        self.now() >= self.end_time
    }
}

/// Install the global time source. Only the first call takes effect.
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

pub fn is_initialized() -> bool {
    TIME_SOURCE.get().is_some()
}

fn source() -> &'static Arc<dyn TimeSource> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource))
}

pub fn now() -> DateTime<Local> {
    source().now()
}

/// Current time as epoch milliseconds.
pub fn now_millis() -> EpochMillis {
    source().now().timestamp_millis()
}

pub fn sleep(duration: StdDuration) {
    source().sleep(duration)
}

pub fn is_simulated() -> bool {
    source().is_simulated()
}

pub fn simulation_ended() -> bool {
    source().is_ended()
}

/// Parse "YYYY-MM-DD HH:MM:SS" in the local timezone.
pub fn parse_datetime(s: &str) -> Result<DateTime<Local>, String> {
    use chrono::NaiveDateTime;

    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))?;
    Local
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| "Ambiguous or invalid local time".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_sleep_advances_and_caps() {
        let start = parse_datetime("2025-03-01 10:00:00").unwrap();
        let end = parse_datetime("2025-03-01 10:01:00").unwrap();
        let source = SimulatedTimeSource::new(start, end);

        source.sleep(StdDuration::from_secs(30));
        assert_eq!(source.now(), start + ChronoDuration::seconds(30));
        assert!(!source.is_ended());

        source.sleep(StdDuration::from_secs(600));
        assert_eq!(source.now(), end);
        assert!(source.is_ended());
    }

    #[test]
    fn test_parse_datetime_rejects_bad_format() {
        assert!(parse_datetime("2025-03-01T10:00").is_err());
        assert!(parse_datetime("2025-03-01 10:00:00").is_ok());
    }
}
