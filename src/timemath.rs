use chrono::{Local, Timelike};
use crate::error::{Error, Result};

/// Number of minutes in a day; also the exclusive end-of-day bound of a block.
pub const MINUTES_PER_DAY: u32 = 1440;

/// Converts a minute of the day into degrees on the dial.
///
/// 0 is the top of the dial (midnight) and angles grow clockwise,
/// so 720 (noon) lands on 180.
pub fn minutes_to_degrees(minute: f64) -> f64 {
    minute / MINUTES_PER_DAY as f64 * 360.0
}

/// Converts degrees on the dial back into a whole minute of the day.
///
/// The result is rounded to the nearest minute and wrapped into `[0, 1440)`.
pub fn degrees_to_minutes(degrees: f64) -> u32 {
    let minutes = (degrees / 360.0 * MINUTES_PER_DAY as f64).round() as i64;
    minutes.rem_euclid(MINUTES_PER_DAY as i64) as u32
}

/// Minute of the day for any time-of-day value.
pub fn minute_of_day<T: Timelike>(time: &T) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Current minute of the day from the local wall clock, in `[0, 1439]`.
pub fn current_minute_of_day() -> u32 {
    minute_of_day(&Local::now())
}

/// Formats a minute of the day as zero-padded `HH:MM`.
///
/// `1440` formats as `24:00`.
pub fn format_hhmm(minute: u32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// Parses `HH:MM` into minutes. Out-of-range parts such as `25:99` pass
/// through for the caller to clamp; totals that overflow `i64` are rejected.
pub fn parse_hhmm(s: &str) -> Result<i64> {
    let (hours, minutes) = s
        .trim()
        .split_once(':')
        .ok_or_else(|| Error::InvalidTime(s.to_string()))?;
    let hours: i64 = hours.trim().parse().map_err(|_| Error::InvalidTime(s.to_string()))?;
    let minutes: i64 = minutes.trim().parse().map_err(|_| Error::InvalidTime(s.to_string()))?;
    hours
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes))
        .ok_or_else(|| Error::InvalidTime(s.to_string()))
}

/// Rounds to the nearest minute and clamps into `[0, 1439]`.
pub fn clamp_minute(x: f64) -> u32 {
    if x.is_nan() {
        return 0;
    }
    x.round().clamp(0.0, (MINUTES_PER_DAY - 1) as f64) as u32
}

/// Default start for a new block: `minute` rounded to the nearest half hour.
pub fn new_block_start(minute: u32) -> u32 {
    ((minute as f64 / 30.0).round() as u32 * 30) % MINUTES_PER_DAY
}
