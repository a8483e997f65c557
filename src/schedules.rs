use std::rc::Rc;
use tracing::{debug, info};
use crate::blocks::BlockStore;
use crate::error::{Error, Result};
use crate::models::{deep_copy, DaySchedule, RoutineBlock};
use crate::storage::{load_json, save_json, KeyValueStore, DAY_SCHEDULES_KEY};

/// Block sets saved per weekday, at most one per day.
pub struct ScheduleStore {
    store: Rc<dyn KeyValueStore>,
    schedules: Vec<DaySchedule>,
}

fn check_day(day: u8) -> Result<()> {
    if day > 6 {
        return Err(Error::InvalidWeekday(day));
    }
    Ok(())
}

impl ScheduleStore {
    pub fn load(store: Rc<dyn KeyValueStore>) -> ScheduleStore {
        let schedules = load_json(store.as_ref(), DAY_SCHEDULES_KEY).unwrap_or_default();
        ScheduleStore { store, schedules }
    }

    pub fn list_all(&self) -> &[DaySchedule] {
        &self.schedules
    }

    pub fn get_for_weekday(&self, day: u8) -> Option<&DaySchedule> {
        self.schedules.iter().find(|s| s.day_of_week == day)
    }

    /// Stores a copy of `blocks` for `day`, replacing any earlier save.
    pub fn save(&mut self, day: u8, blocks: &[RoutineBlock]) -> Result<()> {
        self.save_many(&[day], blocks)
    }

    /// Saves the same blocks for several days with a single write.
    pub fn save_many(&mut self, days: &[u8], blocks: &[RoutineBlock]) -> Result<()> {
        for &day in days {
            check_day(day)?;
        }
        let mut next = self.schedules.clone();
        for &day in days {
            upsert(&mut next, day, blocks);
        }
        self.commit(next)
    }

    /// Copies `from`'s blocks onto each day in `to`. Returns `false` when
    /// `from` has no schedule.
    pub fn copy(&mut self, from: u8, to: &[u8]) -> Result<bool> {
        let source = match self.get_for_weekday(from) {
            Some(s) => deep_copy(&s.blocks),
            None => return Ok(false),
        };
        self.save_many(to, &source)?;
        Ok(true)
    }

    /// Removes `day`'s schedule if there is one.
    pub fn delete(&mut self, day: u8) -> Result<bool> {
        if self.get_for_weekday(day).is_none() {
            return Ok(false);
        }
        let next = self.schedules.iter().filter(|s| s.day_of_week != day).cloned().collect();
        self.commit(next)?;
        Ok(true)
    }

    /// Loads `day`'s schedule into `blocks`. Returns `false` if none is saved.
    pub fn apply(&self, day: u8, blocks: &mut BlockStore) -> Result<bool> {
        match self.get_for_weekday(day) {
            Some(schedule) => {
                blocks.replace_all(deep_copy(&schedule.blocks))?;
                info!(day, "loaded day schedule");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn commit(&mut self, next: Vec<DaySchedule>) -> Result<()> {
        save_json(self.store.as_ref(), DAY_SCHEDULES_KEY, &next)?;
        self.schedules = next;
        Ok(())
    }
}

fn upsert(schedules: &mut Vec<DaySchedule>, day: u8, blocks: &[RoutineBlock]) {
    let blocks = deep_copy(blocks);
    match schedules.iter_mut().find(|s| s.day_of_week == day) {
        Some(existing) => existing.blocks = blocks,
        None => schedules.push(DaySchedule { day_of_week: day, blocks }),
    }
    debug!(day, "saved day schedule");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FlakyStore, MemoryStore};
    use crate::templates::{built_in_templates, default_blocks};

    fn fresh() -> (Rc<MemoryStore>, ScheduleStore) {
        let mem = Rc::new(MemoryStore::new());
        let schedules = ScheduleStore::load(mem.clone());
        (mem, schedules)
    }

    #[test]
    fn saving_twice_keeps_one_entry_with_latest_blocks() {
        let (mem, mut schedules) = fresh();
        let other = built_in_templates()[1].blocks.clone();
        schedules.save(1, &default_blocks()).unwrap();
        schedules.save(1, &other).unwrap();

        assert_eq!(schedules.list_all().len(), 1);
        assert_eq!(schedules.get_for_weekday(1).unwrap().blocks, other);
        assert_eq!(ScheduleStore::load(mem).list_all().len(), 1);
    }

    #[test]
    fn saved_blocks_are_copies() {
        let (_, mut schedules) = fresh();
        let mut blocks = default_blocks();
        schedules.save(3, &blocks).unwrap();
        blocks[0].title = "Changed".into();
        assert_eq!(schedules.get_for_weekday(3).unwrap().blocks[0].title, "Sleep");
    }

    #[test]
    fn rejects_invalid_weekday() {
        let (_, mut schedules) = fresh();
        assert!(matches!(schedules.save(7, &[]), Err(Error::InvalidWeekday(7))));
        assert!(schedules.save_many(&[1, 9], &[]).is_err());
        assert!(schedules.list_all().is_empty());
    }

    #[test]
    fn copy_and_delete() {
        let (_, mut schedules) = fresh();
        assert!(!schedules.copy(2, &[3]).unwrap());
        schedules.save(2, &default_blocks()).unwrap();
        assert!(schedules.copy(2, &[3, 4]).unwrap());
        assert_eq!(schedules.list_all().len(), 3);

        assert!(schedules.delete(3).unwrap());
        assert!(!schedules.delete(3).unwrap());
        assert!(schedules.get_for_weekday(3).is_none());
    }

    #[test]
    fn apply_replaces_live_blocks() {
        let mem = Rc::new(MemoryStore::new());
        let mut blocks = BlockStore::load(mem.clone());
        let mut schedules = ScheduleStore::load(mem);
        let pro = built_in_templates()[1].blocks.clone();
        schedules.save(5, &pro).unwrap();

        assert!(!schedules.apply(4, &mut blocks).unwrap());
        assert_eq!(blocks.list(), default_blocks().as_slice());
        assert!(schedules.apply(5, &mut blocks).unwrap());
        assert_eq!(blocks.list(), pro.as_slice());
    }

    #[test]
    fn failed_writes_leave_schedules_untouched() {
        let flaky = Rc::new(FlakyStore::default());
        let mut schedules = ScheduleStore::load(flaky.clone());
        schedules.save(1, &default_blocks()).unwrap();
        flaky.fail_writes.set(true);

        assert!(schedules.save(2, &default_blocks()).is_err());
        assert!(schedules.copy(1, &[3, 4]).is_err());
        assert!(schedules.delete(1).is_err());
        assert_eq!(schedules.list_all().len(), 1);
        assert_eq!(schedules.get_for_weekday(1).unwrap().day_of_week, 1);
    }
}
