use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::storage::{load_json, save_json, KeyValueStore, POMODORO_SETTINGS_KEY};

/// Focus timer lengths in minutes. Fields missing from storage keep their
/// defaults.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct PomodoroSettings {
    pub work_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    /// A long break follows every n-th work session.
    pub long_break_interval: u32,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        PomodoroSettings {
            work_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            long_break_interval: 4,
        }
    }
}

impl PomodoroSettings {
    pub fn load(store: &dyn KeyValueStore) -> PomodoroSettings {
        load_json(store, POMODORO_SETTINGS_KEY).unwrap_or_default()
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        save_json(store, POMODORO_SETTINGS_KEY, self)
    }

    pub fn reset(store: &dyn KeyValueStore) -> Result<PomodoroSettings> {
        let settings = PomodoroSettings::default();
        settings.save(store)?;
        Ok(settings)
    }

    pub fn duration_secs(&self, mode: PomodoroMode) -> u32 {
        let minutes = match mode {
            PomodoroMode::Work => self.work_minutes,
            PomodoroMode::ShortBreak => self.short_break_minutes,
            PomodoroMode::LongBreak => self.long_break_minutes,
        };
        minutes.saturating_mul(60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PomodoroMode {
    Work,
    ShortBreak,
    LongBreak,
}

impl PomodoroMode {
    pub fn label(&self) -> &'static str {
        match self {
            PomodoroMode::Work => "Focus",
            PomodoroMode::ShortBreak => "Short Break",
            PomodoroMode::LongBreak => "Long Break",
        }
    }
}

/// Work/break cycle state. The caller drives it with [`Pomodoro::tick`].
#[derive(Debug, Clone)]
pub struct Pomodoro {
    pub settings: PomodoroSettings,
    pub mode: PomodoroMode,
    pub running: bool,
    pub remaining_secs: u32,
    pub completed: u32,
}

impl Pomodoro {
    pub fn new(settings: PomodoroSettings) -> Pomodoro {
        Pomodoro {
            settings,
            mode: PomodoroMode::Work,
            running: false,
            remaining_secs: settings.duration_secs(PomodoroMode::Work),
            completed: 0,
        }
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    /// Restarts the current phase from its full length, paused.
    pub fn reset(&mut self) {
        self.running = false;
        self.remaining_secs = self.settings.duration_secs(self.mode);
    }

    /// Ends the current phase early and moves to the next one, paused.
    pub fn skip(&mut self) -> PomodoroMode {
        self.advance()
    }

    /// Counts down `secs` while running. Returns the new mode when the
    /// phase ran out.
    pub fn tick(&mut self, secs: u32) -> Option<PomodoroMode> {
        if !self.running {
            return None;
        }
        if secs < self.remaining_secs {
            self.remaining_secs -= secs;
            return None;
        }
        Some(self.advance())
    }

    /// Remaining time as `MM:SS`.
    pub fn remaining_label(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }

    fn advance(&mut self) -> PomodoroMode {
        self.mode = match self.mode {
            PomodoroMode::Work => {
                self.completed = self.completed.saturating_add(1);
                let interval = self.settings.long_break_interval.max(1);
                if self.completed % interval == 0 {
                    PomodoroMode::LongBreak
                } else {
                    PomodoroMode::ShortBreak
                }
            }
            PomodoroMode::ShortBreak | PomodoroMode::LongBreak => PomodoroMode::Work,
        };
        self.running = false;
        self.remaining_secs = self.settings.duration_secs(self.mode);
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn partial_settings_merge_with_defaults() {
        let store = MemoryStore::new();
        store.write(POMODORO_SETTINGS_KEY, r#"{"work_minutes": 50}"#).unwrap();
        let settings = PomodoroSettings::load(&store);
        assert_eq!(settings.work_minutes, 50);
        assert_eq!(settings.short_break_minutes, 5);
        assert_eq!(settings.long_break_interval, 4);

        let reset = PomodoroSettings::reset(&store).unwrap();
        assert_eq!(PomodoroSettings::load(&store), reset);
    }

    #[test]
    fn huge_lengths_saturate() {
        let settings = PomodoroSettings { work_minutes: 100_000_000, ..Default::default() };
        let mut p = Pomodoro::new(settings);
        assert_eq!(p.remaining_secs, u32::MAX);
        assert_eq!(settings.duration_secs(PomodoroMode::ShortBreak), 300);

        p.toggle();
        assert_eq!(p.tick(60), None);
        assert_eq!(p.remaining_secs, u32::MAX - 60);
    }

    #[test]
    fn long_break_every_interval() {
        let mut p = Pomodoro::new(PomodoroSettings::default());
        let mut modes = Vec::new();
        for _ in 0..8 {
            modes.push(p.skip());
        }
        assert_eq!(
            modes,
            vec![
                PomodoroMode::ShortBreak,
                PomodoroMode::Work,
                PomodoroMode::ShortBreak,
                PomodoroMode::Work,
                PomodoroMode::ShortBreak,
                PomodoroMode::Work,
                PomodoroMode::LongBreak,
                PomodoroMode::Work,
            ]
        );
        assert_eq!(p.completed, 4);
    }

    #[test]
    fn tick_counts_down_only_while_running() {
        let mut p = Pomodoro::new(PomodoroSettings::default());
        assert_eq!(p.tick(10), None);
        assert_eq!(p.remaining_secs, 25 * 60);

        p.toggle();
        assert_eq!(p.tick(60), None);
        assert_eq!(p.remaining_label(), "24:00");
        assert_eq!(p.tick(24 * 60), Some(PomodoroMode::ShortBreak));
        assert!(!p.running);
        assert_eq!(p.remaining_secs, 5 * 60);
    }

    #[test]
    fn reset_restores_full_phase() {
        let mut p = Pomodoro::new(PomodoroSettings::default());
        p.toggle();
        p.tick(100);
        p.reset();
        assert!(!p.running);
        assert_eq!(p.remaining_secs, 25 * 60);
    }
}
