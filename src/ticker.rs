use std::time::Duration;
use chrono::Timelike;
use crate::timemath::{format_hhmm, minute_of_day};

/// Reports wall-clock minute changes to an event loop.
///
/// The loop asks how long to wait with [`MinuteTicker::until_next_minute`]
/// and calls [`MinuteTicker::poll`] when it wakes. After [`MinuteTicker::stop`]
/// no further changes are reported.
#[derive(Debug, Clone)]
pub struct MinuteTicker {
    last_minute: Option<u32>,
    stopped: bool,
}

impl MinuteTicker {
    pub fn new() -> MinuteTicker {
        MinuteTicker { last_minute: None, stopped: false }
    }

    /// Returns the new minute of the day if it changed since the last poll.
    pub fn poll<T: Timelike>(&mut self, now: &T) -> Option<u32> {
        if self.stopped {
            return None;
        }
        let minute = minute_of_day(now);
        if self.last_minute == Some(minute) {
            return None;
        }
        self.last_minute = Some(minute);
        Some(minute)
    }

    /// Time left until the next minute boundary.
    pub fn until_next_minute<T: Timelike>(&self, now: &T) -> Duration {
        let elapsed_ms = now.second() as u64 * 1000 + (now.nanosecond() / 1_000_000).min(999) as u64;
        Duration::from_millis(60_000 - elapsed_ms)
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Last reported minute formatted as `HH:MM`.
    pub fn formatted(&self) -> Option<String> {
        self.last_minute.map(format_hhmm)
    }
}

impl Default for MinuteTicker {
    fn default() -> Self {
        Self::new()
    }
}
