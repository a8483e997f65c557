use chrono::Weekday;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::error::{Error, Result};
use crate::timemath::{clamp_minute, parse_hhmm, MINUTES_PER_DAY};

/// Default block colors, in the order new blocks pick them.
pub const COLOR_PALETTE: [&str; 8] = [
    "#FFB4D6", // pink
    "#A8D8FF", // light blue
    "#FFD6A5", // peach
    "#CAFFBF", // light green
    "#E0D5FF", // lavender
    "#FFF4B0", // pale yellow
    "#B4E3FF", // cyan
    "#FFD1DC", // light pink
];

/// Length of a freshly created block when the user gives no end time.
pub const DEFAULT_BLOCK_MINUTES: u32 = 120;

/// A checklist item owned by a single block.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl Todo {
    pub fn new(text: impl Into<String>) -> Todo {
        Todo {
            id: new_id("todo"),
            text: text.into(),
            completed: false,
        }
    }
}

/// A titled, colored segment of the day covering `[start_minute, end_minute)`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RoutineBlock {
    /// Unique within the containing block set.
    pub id: String,
    pub title: String,
    /// Hex color, e.g. `#A8D8FF`.
    pub color: String,
    /// Minutes since local midnight, inclusive.
    pub start_minute: u32,
    /// Minutes since local midnight, exclusive. `1440` is end of day.
    pub end_minute: u32,
    #[serde(default)]
    pub todos: Vec<Todo>,
}

impl RoutineBlock {
    /// Creates a block with a freshly generated id and no todos.
    pub fn new(title: impl Into<String>, color: impl Into<String>, start_minute: u32, end_minute: u32) -> RoutineBlock {
        RoutineBlock {
            id: new_id("block"),
            title: title.into(),
            color: color.into(),
            start_minute,
            end_minute,
            todos: Vec::new(),
        }
    }

    pub fn contains(&self, minute: u32) -> bool {
        minute >= self.start_minute && minute < self.end_minute
    }

    pub fn duration(&self) -> u32 {
        self.end_minute.saturating_sub(self.start_minute)
    }

    pub fn validate(&self) -> Result<()> {
        validate_range(self.start_minute, self.end_minute)
    }
}

/// Partial update for a block. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct BlockPatch {
    pub title: Option<String>,
    pub color: Option<String>,
    pub start_minute: Option<u32>,
    pub end_minute: Option<u32>,
    pub todos: Option<Vec<Todo>>,
}

impl BlockPatch {
    pub fn apply(self, block: &mut RoutineBlock) {
        if let Some(t) = self.title { block.title = t; }
        if let Some(c) = self.color { block.color = c; }
        if let Some(s) = self.start_minute { block.start_minute = s; }
        if let Some(e) = self.end_minute { block.end_minute = e; }
        if let Some(todos) = self.todos { block.todos = todos; }
    }
}

/// A named, reusable block set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub blocks: Vec<RoutineBlock>,
}

/// A block set saved for one weekday (0 = Sunday ... 6 = Saturday).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DaySchedule {
    pub day_of_week: u8,
    pub blocks: Vec<RoutineBlock>,
}

pub const DAY_NAMES: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

pub const WEEKDAYS: [u8; 5] = [1, 2, 3, 4, 5];
pub const WEEKEND: [u8; 2] = [0, 6];

pub fn day_name(day: u8) -> &'static str {
    DAY_NAMES.get(day as usize).copied().unwrap_or("?")
}

/// Parses a comma separated day list such as `mon,wed`, `1,3`,
/// `weekdays` or `weekend` into sorted, de-duplicated weekday numbers.
pub fn parse_days(s: &str) -> Result<Vec<u8>> {
    let mut days = Vec::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.to_lowercase().as_str() {
            "weekdays" => days.extend(WEEKDAYS),
            "weekend" => days.extend(WEEKEND),
            other => {
                if let Ok(n) = other.parse::<u8>() {
                    if n > 6 {
                        return Err(Error::InvalidWeekday(n));
                    }
                    days.push(n);
                } else {
                    let weekday: Weekday = other
                        .parse()
                        .map_err(|_| Error::UnknownDay(part.to_string()))?;
                    days.push(weekday.num_days_from_sunday() as u8);
                }
            }
        }
    }
    days.sort_unstable();
    days.dedup();
    Ok(days)
}

/// Rejects zero or negative length blocks and ends past midnight.
pub fn validate_range(start: u32, end: u32) -> Result<()> {
    if end <= start || end > MINUTES_PER_DAY {
        return Err(Error::InvalidRange { start, end });
    }
    Ok(())
}

/// Parses an editor's `HH:MM` pair into a validated minute range.
///
/// The start is clamped to `[0, 1439]`; the end is clamped to `[0, 1440]`
/// so that `24:00` can close the day.
pub fn parse_range(start: &str, end: &str) -> Result<(u32, u32)> {
    let start = clamp_minute(parse_hhmm(start)? as f64);
    let end = parse_hhmm(end)?.clamp(0, MINUTES_PER_DAY as i64) as u32;
    validate_range(start, end)?;
    Ok((start, end))
}

/// Parses `#RRGGBB` into its components.
pub fn hex_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

pub(crate) fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Clones a block set so later edits to either side stay independent.
pub fn deep_copy(blocks: &[RoutineBlock]) -> Vec<RoutineBlock> {
    blocks.to_vec()
}
