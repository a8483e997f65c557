use std::io::{self, Write};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use crate::geometry::{block_arc, free_slots, hit_test, Hit, Point, Ring};
use crate::models::{
    day_name, hex_rgb, parse_days, parse_range, BlockPatch, RoutineBlock,
    COLOR_PALETTE, DEFAULT_BLOCK_MINUTES,
};
use crate::pomodoro::PomodoroSettings;
use crate::session::{today_weekday, Planner, SessionStart};
use crate::storage::clear_all;
use crate::timemath::{clamp_minute, current_minute_of_day, format_hhmm, parse_hhmm, MINUTES_PER_DAY};

fn color_cell(color: &str) -> Cell {
    match hex_rgb(color) {
        Some((r, g, b)) => Cell::new("██").fg(Color::Rgb { r, g, b }),
        None => Cell::new(color),
    }
}

fn range_label(start: u32, end: u32) -> String {
    format!("{}-{}", format_hhmm(start), format_hhmm(end))
}

fn blocks_table(blocks: &[RoutineBlock], active_id: Option<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Time").add_attribute(Attribute::Bold),
            Cell::new("Length").add_attribute(Attribute::Bold),
            Cell::new("Todos").add_attribute(Attribute::Bold),
        ]);
    for b in blocks {
        let done = b.todos.iter().filter(|t| t.completed).count();
        let title = if Some(b.id.as_str()) == active_id {
            Cell::new(format!("{} (now)", b.title)).add_attribute(Attribute::Bold)
        } else {
            Cell::new(&b.title)
        };
        table.add_row(vec![
            Cell::new(&b.id),
            color_cell(&b.color),
            title,
            Cell::new(range_label(b.start_minute, b.end_minute)),
            Cell::new(format!("{}h{:02}", b.duration() / 60, b.duration() % 60)),
            Cell::new(if b.todos.is_empty() { String::new() } else { format!("{}/{}", done, b.todos.len()) }),
        ]);
    }
    table
}

/// Lists today's blocks in a formatted table.
pub fn cmd_block_list() {
    let planner = Planner::open_default();
    let blocks = planner.blocks.list();
    if blocks.is_empty() {
        println!("No blocks found.");
        return;
    }
    let active = planner.blocks.active_at(current_minute_of_day()).map(|b| b.id.clone());
    println!("{}", blocks_table(blocks, active.as_deref()));
}

/// Adds a block. The end defaults to two hours after the start.
pub fn cmd_block_add(title: String, start: String, end: Option<String>, color: Option<String>, silent: bool) {
    let title = title.trim().to_string();
    if title.is_empty() {
        if !silent { eprintln!("Please enter a title."); }
        return;
    }
    let end = match end {
        Some(e) => e,
        None => match parse_hhmm(&start) {
            Ok(s) => format_hhmm(clamp_minute(s as f64).saturating_add(DEFAULT_BLOCK_MINUTES).min(MINUTES_PER_DAY)),
            Err(e) => {
                if !silent { eprintln!("{}", e); }
                return;
            }
        },
    };
    let (start_minute, end_minute) = match parse_range(&start, &end) {
        Ok(r) => r,
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return;
        }
    };

    let mut planner = Planner::open_default();
    let color = color.unwrap_or_else(|| COLOR_PALETTE[0].to_string());
    let block = RoutineBlock::new(title, color, start_minute, end_minute);
    let id = block.id.clone();
    if let Err(e) = planner.blocks.add(block) {
        if !silent { eprintln!("Failed to save blocks: {}", e); }
    } else {
        if !silent { println!("Block added (id = {})", id); }
    }
}

/// Edits a block's title, color or time range.
pub fn cmd_block_edit(id: String, title: Option<String>, start: Option<String>, end: Option<String>, color: Option<String>, silent: bool) {
    let mut planner = Planner::open_default();
    let Some(existing) = planner.blocks.get(&id) else {
        if !silent { eprintln!("Block {} not found.", id); }
        return;
    };

    let start = start.unwrap_or_else(|| format_hhmm(existing.start_minute));
    let end = end.unwrap_or_else(|| format_hhmm(existing.end_minute));
    let (start_minute, end_minute) = match parse_range(&start, &end) {
        Ok(r) => r,
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return;
        }
    };

    let patch = BlockPatch {
        title: title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
        color,
        start_minute: Some(start_minute),
        end_minute: Some(end_minute),
        todos: None,
    };
    match planner.blocks.update(&id, patch) {
        Ok(_) => { if !silent { println!("Block {} updated.", id); } },
        Err(e) => { if !silent { eprintln!("Failed to update block: {}", e); } },
    }
}

/// Removes a block and its todos.
pub fn cmd_block_remove(id: String, silent: bool) {
    let mut planner = Planner::open_default();
    match planner.blocks.delete(&id) {
        Ok(true) => { if !silent { println!("Block {} removed.", id); } },
        Ok(false) => { if !silent { eprintln!("Block {} not found.", id); } },
        Err(e) => { if !silent { eprintln!("Failed to save blocks: {}", e); } },
    }
}

pub fn cmd_todo_add(block_id: String, text: String, silent: bool) {
    let mut planner = Planner::open_default();
    match planner.blocks.add_todo(&block_id, text.trim()) {
        Ok(todo) => { if !silent { println!("Todo added (id = {})", todo.id); } },
        Err(e) => { if !silent { eprintln!("{}", e); } },
    }
}

pub fn cmd_todo_toggle(block_id: String, todo_id: String, silent: bool) {
    let mut planner = Planner::open_default();
    match planner.blocks.toggle_todo(&block_id, &todo_id) {
        Ok(done) => {
            if !silent { println!("Todo {} marked as {}.", todo_id, if done { "done" } else { "open" }); }
        }
        Err(e) => { if !silent { eprintln!("{}", e); } },
    }
}

pub fn cmd_todo_remove(block_id: String, todo_id: String, silent: bool) {
    let mut planner = Planner::open_default();
    match planner.blocks.remove_todo(&block_id, &todo_id) {
        Ok(()) => { if !silent { println!("Todo {} removed.", todo_id); } },
        Err(e) => { if !silent { eprintln!("{}", e); } },
    }
}

/// Prints the current time, the active block and its todos.
pub fn cmd_now() {
    let planner = Planner::open_default();
    let minute = current_minute_of_day();
    println!("{}", format_hhmm(minute));
    match planner.blocks.active_at(minute) {
        Some(b) => {
            let left = b.end_minute - minute;
            println!("Now: {} ({}, {}h{:02} left)", b.title, range_label(b.start_minute, b.end_minute), left / 60, left % 60);
            for t in &b.todos {
                println!("  [{}] {}", if t.completed { "x" } else { " " }, t.text);
            }
        }
        None => println!("No block right now."),
    }
}

/// Lists the parts of the day no block covers.
pub fn cmd_free() {
    let planner = Planner::open_default();
    let slots = free_slots(planner.blocks.list());
    if slots.is_empty() {
        println!("The whole day is planned.");
        return;
    }
    for (start, end) in slots {
        println!("{}  ({} min)", range_label(start, end), end - start);
    }
}

/// Prints the SVG outline of every block on the default dial.
pub fn cmd_dial() {
    let planner = Planner::open_default();
    let ring = Ring::default();
    for b in planner.blocks.list() {
        println!("{}\t{}\t{}", b.id, b.color, block_arc(b, &ring).to_svg());
    }
}

/// Hit-tests a point on the default 600x600 dial.
pub fn cmd_hit(x: f64, y: f64) {
    let planner = Planner::open_default();
    match hit_test(Point::new(x, y), &Ring::default(), planner.blocks.list()) {
        Hit::Block(b) => println!("{}\t{}\t{}", b.id, b.title, range_label(b.start_minute, b.end_minute)),
        Hit::EmptySlot(minute) => println!("empty\t{}", format_hhmm(minute)),
        Hit::Miss => println!("miss"),
    }
}

/// Lists all visible templates.
pub fn cmd_template_list() {
    let planner = Planner::open_default();
    let current = planner.templates.current_id().to_string();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Name", "Blocks", "Kind", ""]);
    for t in planner.templates.list_all() {
        table.add_row(vec![
            t.id.clone(),
            t.name.clone(),
            t.blocks.len().to_string(),
            if planner.templates.is_built_in(&t.id) { "built-in".into() } else { "custom".into() },
            if t.id == current { "active".into() } else { String::new() },
        ]);
    }
    println!("{table}");
}

/// Switches today's blocks to a template.
pub fn cmd_template_use(id: String, silent: bool) {
    let mut planner = Planner::open_default();
    let found = planner.templates.get_by_id(&id).is_some();
    if let Err(e) = planner.templates.switch_to(&id, &mut planner.blocks) {
        if !silent { eprintln!("Failed to switch template: {}", e); }
        return;
    }
    if !silent {
        if found {
            println!("Switched to template '{}'.", id);
        } else {
            eprintln!("Template '{}' not found. Loaded the default day.", id);
        }
    }
}

/// Saves today's blocks as a new template.
pub fn cmd_template_save(name: String, silent: bool) {
    let name = name.trim().to_string();
    if name.is_empty() {
        if !silent { eprintln!("Please enter a template name."); }
        return;
    }
    let mut planner = Planner::open_default();
    let blocks = planner.blocks.list().to_vec();
    match planner.templates.create_from_current_blocks(&name, &blocks) {
        Ok(t) => { if !silent { println!("Template '{}' saved (id = {}).", t.name, t.id); } },
        Err(e) => { if !silent { eprintln!("Failed to save template: {}", e); } },
    }
}

/// Removes a template. Removing the active one switches back to the student day.
pub fn cmd_template_remove(id: String, silent: bool) {
    let mut planner = Planner::open_default();
    match planner.templates.remove(&id) {
        Ok(true) => {
            if planner.templates.current_id() == id {
                match planner.templates.switch_to_surviving(&mut planner.blocks) {
                    Ok(next) => { if !silent { println!("Switched to template '{}'.", next); } },
                    Err(e) => { if !silent { eprintln!("Failed to switch template: {}", e); } },
                }
            }
            if !silent { println!("Template '{}' removed.", id); }
        }
        Ok(false) => { if !silent { eprintln!("Template '{}' not found.", id); } },
        Err(e) => { if !silent { eprintln!("Failed to save templates: {}", e); } },
    }
}

/// Brings back a removed built-in template.
pub fn cmd_template_restore(id: String, silent: bool) {
    let mut planner = Planner::open_default();
    match planner.templates.restore(&id) {
        Ok(true) => { if !silent { println!("Template '{}' restored.", id); } },
        Ok(false) => { if !silent { eprintln!("'{}' is not a built-in template.", id); } },
        Err(e) => { if !silent { eprintln!("Failed to save templates: {}", e); } },
    }
}

fn days_or_today(days: Option<String>) -> crate::error::Result<Vec<u8>> {
    match days {
        Some(d) if d.trim().eq_ignore_ascii_case("today") => Ok(vec![today_weekday()]),
        Some(d) => parse_days(&d),
        None => Ok(vec![today_weekday()]),
    }
}

/// Lists saved day schedules.
pub fn cmd_schedule_list() {
    let planner = Planner::open_default();
    let today = today_weekday();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL)
        .set_header(vec!["Day", "Blocks", "Span", ""]);
    for day in 0..7u8 {
        let (count, span) = match planner.schedules.get_for_weekday(day) {
            Some(s) => {
                let start = s.blocks.iter().map(|b| b.start_minute).min().unwrap_or(0);
                let end = s.blocks.iter().map(|b| b.end_minute).max().unwrap_or(0);
                (s.blocks.len().to_string(), if s.blocks.is_empty() { "-".to_string() } else { range_label(start, end) })
            }
            None => ("-".to_string(), "-".to_string()),
        };
        table.add_row(vec![
            day_name(day).to_string(),
            count,
            span,
            if day == today { "today".into() } else { String::new() },
        ]);
    }
    println!("{table}");
}

/// Saves today's blocks for the given days (default: today).
pub fn cmd_schedule_save(days: Option<String>, silent: bool) {
    let days = match days_or_today(days) {
        Ok(d) => d,
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return;
        }
    };
    let mut planner = Planner::open_default();
    let blocks = planner.blocks.list().to_vec();
    match planner.schedules.save_many(&days, &blocks) {
        Ok(()) => {
            if !silent {
                let names: Vec<&str> = days.iter().map(|d| day_name(*d)).collect();
                println!("Schedule saved for {}.", names.join(", "));
            }
        }
        Err(e) => { if !silent { eprintln!("Failed to save schedules: {}", e); } },
    }
}

/// Copies one day's schedule onto other days.
pub fn cmd_schedule_copy(from: String, to: String, silent: bool) {
    let (from, to) = match (parse_days(&from), parse_days(&to)) {
        (Ok(f), Ok(t)) if f.len() == 1 => (f[0], t),
        (Ok(_), Ok(_)) => {
            if !silent { eprintln!("Copy from exactly one day."); }
            return;
        }
        (Err(e), _) | (_, Err(e)) => {
            if !silent { eprintln!("{}", e); }
            return;
        }
    };
    let mut planner = Planner::open_default();
    match planner.schedules.copy(from, &to) {
        Ok(true) => { if !silent { println!("Copied {} to {} day(s).", day_name(from), to.len()); } },
        Ok(false) => { if !silent { eprintln!("No schedule saved for {}.", day_name(from)); } },
        Err(e) => { if !silent { eprintln!("Failed to save schedules: {}", e); } },
    }
}

/// Loads a day's schedule into today's blocks.
pub fn cmd_schedule_load(day: String, silent: bool) {
    let day = match days_or_today(Some(day)) {
        Ok(d) if d.len() == 1 => d[0],
        Ok(_) => {
            if !silent { eprintln!("Load exactly one day."); }
            return;
        }
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return;
        }
    };
    let mut planner = Planner::open_default();
    match planner.schedules.apply(day, &mut planner.blocks) {
        Ok(true) => { if !silent { println!("Loaded {}'s schedule.", day_name(day)); } },
        Ok(false) => { if !silent { eprintln!("No schedule saved for {}.", day_name(day)); } },
        Err(e) => { if !silent { eprintln!("Failed to save blocks: {}", e); } },
    }
}

pub fn cmd_schedule_remove(day: String, silent: bool) {
    let days = match parse_days(&day) {
        Ok(d) => d,
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return;
        }
    };
    let mut planner = Planner::open_default();
    for day in days {
        match planner.schedules.delete(day) {
            Ok(true) => { if !silent { println!("{} schedule removed.", day_name(day)); } },
            Ok(false) => { if !silent { eprintln!("No schedule saved for {}.", day_name(day)); } },
            Err(e) => { if !silent { eprintln!("Failed to save schedules: {}", e); } },
        }
    }
}

/// Runs the start-of-day check: today's schedule, if saved, replaces the blocks.
pub fn cmd_schedule_today(silent: bool) {
    let mut planner = Planner::open_default();
    match planner.start_session_now() {
        Ok(SessionStart::Schedule(day)) => { if !silent { println!("Loaded {}'s schedule.", day_name(day)); } },
        Ok(SessionStart::Template(id)) => { if !silent { println!("No schedule for today. Keeping template '{}'.", id); } },
        Err(e) => { if !silent { eprintln!("Failed to load today's schedule: {}", e); } },
    }
}

pub fn cmd_pomodoro_show() {
    let planner = Planner::open_default();
    let s = planner.pomodoro_settings();
    println!("Focus:       {} min", s.work_minutes);
    println!("Short break: {} min", s.short_break_minutes);
    println!("Long break:  {} min", s.long_break_minutes);
    println!("Long break every {} sessions", s.long_break_interval);
}

pub fn cmd_pomodoro_set(work: Option<u32>, short: Option<u32>, long: Option<u32>, interval: Option<u32>, silent: bool) {
    let planner = Planner::open_default();
    let mut s: PomodoroSettings = planner.pomodoro_settings();
    if let Some(w) = work { s.work_minutes = w.max(1); }
    if let Some(b) = short { s.short_break_minutes = b.max(1); }
    if let Some(b) = long { s.long_break_minutes = b.max(1); }
    if let Some(i) = interval { s.long_break_interval = i.max(1); }
    if let Err(e) = s.save(planner.store()) {
        if !silent { eprintln!("Failed to save pomodoro settings: {}", e); }
    } else {
        if !silent { println!("Pomodoro settings updated."); }
    }
}

pub fn cmd_pomodoro_reset(silent: bool) {
    let planner = Planner::open_default();
    match PomodoroSettings::reset(planner.store()) {
        Ok(_) => { if !silent { println!("Pomodoro settings reset."); } },
        Err(e) => { if !silent { eprintln!("Failed to save pomodoro settings: {}", e); } },
    }
}

/// Deletes all stored blocks, templates, schedules and settings.
pub fn cmd_reset(force: bool) {
    if !force {
        print!("Are you sure you want to delete all blocks, templates and schedules? This cannot be undone. [y/N] ");
        let _ = io::stdout().flush();
        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() || input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return;
        }
    }

    let planner = Planner::open_default();
    if let Err(e) = clear_all(planner.store()) {
        eprintln!("Failed to reset data: {}", e);
    } else {
        println!("Data reset successfully.");
    }
}

