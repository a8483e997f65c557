use dayring::commands::*;
use dayring::geometry::free_slots;
use dayring::session::Planner;
use dayring::templates::{PROFESSIONAL_ID, STUDENT_ID};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

// Use a mutex to ensure tests run serially since they modify the environment variable
static TEST_MUTEX: Mutex<()> = Mutex::new(());

fn with_test_dir<F>(f: F)
where
    F: FnOnce(&Path),
{
    let _guard = TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let dir = TempDir::new().unwrap();
    env::set_var("DAYRING_DATA_DIR", dir.path());

    f(dir.path());

    env::remove_var("DAYRING_DATA_DIR");
}

#[test]
fn test_fresh_install_is_a_full_student_day() {
    with_test_dir(|_dir| {
        let planner = Planner::open_default();
        let blocks = planner.blocks.list();
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].start_minute, 0);
        assert_eq!(blocks[3].end_minute, 1440);
        assert!(free_slots(blocks).is_empty());
        assert_eq!(planner.templates.current_id(), STUDENT_ID);
    });
}

#[test]
fn test_block_add_edit_remove() {
    with_test_dir(|_dir| {
        cmd_block_add("Gym".into(), "06:00".into(), Some("07:30".into()), None, true);

        let planner = Planner::open_default();
        let gym = planner.blocks.list().last().unwrap().clone();
        assert_eq!(gym.title, "Gym");
        assert_eq!((gym.start_minute, gym.end_minute), (360, 450));
        assert!(gym.id.starts_with("block_"));

        cmd_block_edit(gym.id.clone(), Some("Run".into()), None, Some("24:00".into()), Some("#123456".into()), true);
        let planner = Planner::open_default();
        let run = planner.blocks.get(&gym.id).unwrap();
        assert_eq!(run.title, "Run");
        assert_eq!((run.start_minute, run.end_minute), (360, 1440));
        assert_eq!(run.color, "#123456");

        cmd_block_remove(gym.id.clone(), true);
        let planner = Planner::open_default();
        assert!(planner.blocks.get(&gym.id).is_none());
        assert_eq!(planner.blocks.list().len(), 4);
    });
}

#[test]
fn test_block_add_defaults_to_two_hours_and_rejects_bad_ranges() {
    with_test_dir(|_dir| {
        cmd_block_add("Reading".into(), "23:00".into(), None, None, true);
        cmd_block_add("Backwards".into(), "10:00".into(), Some("09:00".into()), None, true);
        cmd_block_add("  ".into(), "10:00".into(), None, None, true);

        let planner = Planner::open_default();
        let blocks = planner.blocks.list();
        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks[4].title, "Reading");
        assert_eq!((blocks[4].start_minute, blocks[4].end_minute), (1380, 1440));
    });
}

#[test]
fn test_edit_with_invalid_range_leaves_block_alone() {
    with_test_dir(|_dir| {
        cmd_block_edit("student-school".into(), None, Some("17:00".into()), None, None, true);

        let planner = Planner::open_default();
        let school = planner.blocks.get("student-school").unwrap();
        assert_eq!((school.start_minute, school.end_minute), (480, 960));
    });
}

#[test]
fn test_todos() {
    with_test_dir(|_dir| {
        cmd_todo_add("student-study".into(), "Flashcards".into(), true);
        let planner = Planner::open_default();
        let todo = planner.blocks.get("student-study").unwrap().todos[0].clone();
        assert_eq!(todo.text, "Flashcards");
        assert!(!todo.completed);

        cmd_todo_toggle("student-study".into(), todo.id.clone(), true);
        let planner = Planner::open_default();
        assert!(planner.blocks.get("student-study").unwrap().todos[0].completed);

        cmd_todo_remove("student-study".into(), todo.id.clone(), true);
        let planner = Planner::open_default();
        assert!(planner.blocks.get("student-study").unwrap().todos.is_empty());
    });
}

#[test]
fn test_template_use_and_unknown_fallback() {
    with_test_dir(|_dir| {
        cmd_template_use(PROFESSIONAL_ID.into(), true);
        let planner = Planner::open_default();
        assert_eq!(planner.templates.current_id(), PROFESSIONAL_ID);
        assert_eq!(planner.blocks.list()[1].id, "pro-deepwork");

        cmd_template_use("no-such-template".into(), true);
        let planner = Planner::open_default();
        assert_eq!(planner.blocks.list()[1].id, "student-school");
        assert_eq!(planner.templates.current_id(), PROFESSIONAL_ID);
    });
}

#[test]
fn test_template_save_and_remove() {
    with_test_dir(|_dir| {
        cmd_block_add("Nap".into(), "13:00".into(), Some("13:30".into()), None, true);
        cmd_template_save("Lazy Sunday".into(), true);

        let planner = Planner::open_default();
        let custom = planner.templates.list_all().into_iter().find(|t| t.name == "Lazy Sunday").unwrap().clone();
        assert!(custom.id.starts_with("custom_"));
        assert_eq!(custom.blocks.len(), 5);

        cmd_template_use(custom.id.clone(), true);
        cmd_template_remove(custom.id.clone(), true);
        let planner = Planner::open_default();
        assert!(planner.templates.get_by_id(&custom.id).is_none());
        assert_eq!(planner.templates.current_id(), STUDENT_ID);
        assert_eq!(planner.blocks.list().len(), 4);
    });
}

#[test]
fn test_built_in_remove_is_soft_and_restorable() {
    with_test_dir(|_dir| {
        cmd_template_remove(PROFESSIONAL_ID.into(), true);
        cmd_template_remove(PROFESSIONAL_ID.into(), true);
        let planner = Planner::open_default();
        assert_eq!(planner.templates.list_all().len(), 1);
        assert!(planner.templates.get_by_id(PROFESSIONAL_ID).is_none());

        cmd_template_restore(PROFESSIONAL_ID.into(), true);
        let planner = Planner::open_default();
        assert_eq!(planner.templates.list_all().len(), 2);
    });
}

#[test]
fn test_schedule_save_copy_load() {
    with_test_dir(|_dir| {
        cmd_template_use(PROFESSIONAL_ID.into(), true);
        cmd_schedule_save(Some("mon".into()), true);
        cmd_schedule_copy("monday".into(), "tue,wed".into(), true);

        let planner = Planner::open_default();
        for day in [1u8, 2, 3] {
            let s = planner.schedules.get_for_weekday(day).unwrap();
            assert_eq!(s.blocks[0].id, "pro-sleep");
        }
        assert!(planner.schedules.get_for_weekday(4).is_none());

        cmd_template_use(STUDENT_ID.into(), true);
        cmd_schedule_load("wed".into(), true);
        let planner = Planner::open_default();
        assert_eq!(planner.blocks.list()[0].id, "pro-sleep");

        cmd_schedule_remove("tue".into(), true);
        let planner = Planner::open_default();
        assert!(planner.schedules.get_for_weekday(2).is_none());
        assert_eq!(planner.schedules.list_all().len(), 2);
    });
}

#[test]
fn test_schedule_is_a_copy_of_the_blocks() {
    with_test_dir(|_dir| {
        cmd_schedule_save(Some("sat".into()), true);
        cmd_block_edit("student-free".into(), Some("Party".into()), None, None, None, true);

        let planner = Planner::open_default();
        let saturday = planner.schedules.get_for_weekday(6).unwrap();
        let free = saturday.blocks.iter().find(|b| b.id == "student-free").unwrap();
        assert_eq!(free.title, "Free Time");
    });
}

#[test]
fn test_pomodoro_settings() {
    with_test_dir(|_dir| {
        cmd_pomodoro_set(Some(50), None, Some(20), Some(0), true);
        let s = Planner::open_default().pomodoro_settings();
        assert_eq!(s.work_minutes, 50);
        assert_eq!(s.short_break_minutes, 5);
        assert_eq!(s.long_break_minutes, 20);
        assert_eq!(s.long_break_interval, 1);

        cmd_pomodoro_reset(true);
        let s = Planner::open_default().pomodoro_settings();
        assert_eq!(s.work_minutes, 25);
    });
}

#[test]
fn test_corrupt_files_fall_back_to_defaults() {
    with_test_dir(|dir| {
        fs::write(dir.join("blocks.json"), "{ not json").unwrap();
        fs::write(dir.join("current_template.json"), "42").unwrap();

        let planner = Planner::open_default();
        assert_eq!(planner.blocks.list().len(), 4);
        assert_eq!(planner.templates.current_id(), STUDENT_ID);
    });
}

#[test]
fn test_reset_clears_everything() {
    with_test_dir(|dir| {
        cmd_template_save("Mine".into(), true);
        cmd_schedule_save(Some("weekdays".into()), true);
        cmd_pomodoro_set(Some(30), None, None, None, true);
        assert!(dir.join("day_schedules.json").exists());

        cmd_reset(true);

        assert!(!dir.join("day_schedules.json").exists());
        let planner = Planner::open_default();
        assert!(planner.schedules.list_all().is_empty());
        assert_eq!(planner.templates.list_all().len(), 2);
        assert_eq!(planner.pomodoro_settings().work_minutes, 25);
    });
}

#[test]
fn test_block_add_with_huge_start_clamps_instead_of_overflowing() {
    with_test_dir(|_dir| {
        cmd_block_add("Late".into(), "71582788:15".into(), None, None, true);
        cmd_block_add("Early".into(), "-71582788:15".into(), None, None, true);
        cmd_block_add("Absurd".into(), "153722867280912931:00".into(), None, None, true);

        let planner = Planner::open_default();
        let blocks = planner.blocks.list();
        assert_eq!(blocks.len(), 6);
        assert_eq!((blocks[4].start_minute, blocks[4].end_minute), (1439, 1440));
        assert_eq!((blocks[5].start_minute, blocks[5].end_minute), (0, 120));
    });
}

#[test]
fn test_removing_active_template_with_student_hidden() {
    with_test_dir(|_dir| {
        cmd_template_save("Gym Day".into(), true);
        cmd_template_remove(STUDENT_ID.into(), true);
        cmd_template_use(PROFESSIONAL_ID.into(), true);
        cmd_template_remove(PROFESSIONAL_ID.into(), true);

        let planner = Planner::open_default();
        let gym = planner.templates.list_all()[0].clone();
        assert_eq!(gym.name, "Gym Day");
        assert_eq!(planner.templates.current_id(), gym.id);
        assert_eq!(planner.templates.current().id, gym.id);
    });
}
