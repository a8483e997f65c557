use std::rc::Rc;
use chrono::{Datelike, Local, Weekday};
use tracing::info;
use crate::blocks::BlockStore;
use crate::error::Result;
use crate::pomodoro::PomodoroSettings;
use crate::schedules::ScheduleStore;
use crate::storage::{JsonFileStore, KeyValueStore};
use crate::templates::TemplateStore;

/// What decided today's blocks when the session started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStart {
    /// The weekday's saved schedule replaced the live blocks.
    Schedule(u8),
    /// No schedule for today; the last active template's blocks stay.
    Template(String),
}

/// All stores over one persistence port.
pub struct Planner {
    store: Rc<dyn KeyValueStore>,
    pub blocks: BlockStore,
    pub templates: TemplateStore,
    pub schedules: ScheduleStore,
    started: Option<SessionStart>,
}

impl Planner {
    pub fn open(store: Rc<dyn KeyValueStore>) -> Planner {
        Planner {
            blocks: BlockStore::load(store.clone()),
            templates: TemplateStore::load(store.clone()),
            schedules: ScheduleStore::load(store.clone()),
            store,
            started: None,
        }
    }

    /// Planner over the JSON files in the default data directory.
    pub fn open_default() -> Planner {
        Planner::open(Rc::new(JsonFileStore::open_default()))
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn pomodoro_settings(&self) -> PomodoroSettings {
        PomodoroSettings::load(self.store())
    }

    /// Applies today's schedule, if any, over the live blocks.
    ///
    /// Runs once per planner; later calls return the first outcome without
    /// touching the blocks again, even if the day has changed since.
    pub fn start_session(&mut self, today: Weekday) -> Result<SessionStart> {
        if let Some(started) = &self.started {
            return Ok(started.clone());
        }
        let day = today.num_days_from_sunday() as u8;
        let outcome = if self.schedules.apply(day, &mut self.blocks)? {
            SessionStart::Schedule(day)
        } else {
            SessionStart::Template(self.templates.current_id().to_string())
        };
        info!(?outcome, "session started");
        self.started = Some(outcome.clone());
        Ok(outcome)
    }

    pub fn start_session_now(&mut self) -> Result<SessionStart> {
        self.start_session(Local::now().weekday())
    }
}

/// Weekday number (0 = Sunday) for today in local time.
pub fn today_weekday() -> u8 {
    Local::now().weekday().num_days_from_sunday() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::templates::{built_in_templates, PROFESSIONAL_ID, STUDENT_ID};

    #[test]
    fn todays_schedule_overrides_the_template_once() {
        let mem: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
        let pro = built_in_templates()[1].blocks.clone();
        {
            let mut planner = Planner::open(mem.clone());
            planner.schedules.save(1, &pro).unwrap();
        }

        let mut planner = Planner::open(mem.clone());
        assert_eq!(planner.start_session(Weekday::Mon).unwrap(), SessionStart::Schedule(1));
        assert_eq!(planner.blocks.list(), pro.as_slice());
        assert_eq!(planner.templates.current_id(), STUDENT_ID);

        planner.templates.switch_to(STUDENT_ID, &mut planner.blocks).unwrap();
        assert_eq!(planner.start_session(Weekday::Mon).unwrap(), SessionStart::Schedule(1));
        assert_eq!(planner.blocks.list()[0].id, "student-sleep-1");
    }

    #[test]
    fn without_a_schedule_the_template_stays() {
        let mem: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
        let mut planner = Planner::open(mem);
        planner.templates.switch_to(PROFESSIONAL_ID, &mut planner.blocks).unwrap();
        assert_eq!(
            planner.start_session(Weekday::Sun).unwrap(),
            SessionStart::Template(PROFESSIONAL_ID.to_string())
        );
        assert_eq!(planner.blocks.list()[0].id, "pro-sleep");
    }
}
