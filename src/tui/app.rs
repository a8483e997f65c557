use chrono::Timelike;
use ratatui::layout::Rect;
use ratatui::widgets::TableState;
use tracing::warn;
use crate::error::Result;
use crate::geometry::{hit_test, Hit, Point, Ring};
use crate::models::{day_name, parse_range, BlockPatch, RoutineBlock, Template, COLOR_PALETTE, DEFAULT_BLOCK_MINUTES};
use crate::pomodoro::Pomodoro;
use crate::session::{today_weekday, Planner, SessionStart};
use crate::templates::{built_in_templates, is_built_in};
use crate::ticker::MinuteTicker;
use crate::timemath::{current_minute_of_day, format_hhmm, new_block_start, MINUTES_PER_DAY};

/// Side length of the dial's coordinate space.
pub const DIAL_SIZE: f64 = 600.0;

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
}

#[derive(PartialEq, Clone, Copy)]
pub enum ViewMode {
    Dial,
    Templates,
}

#[derive(PartialEq, Clone, Copy)]
pub enum InputField {
    None,
    Title,
    Start,
    End,
    Todo,
    TemplateName,
}

/// State for the multi-step "Add Block" wizard.
#[derive(Default)]
pub struct AddState {
    pub title: String,
    pub start: String,
    pub step: usize, // 0: Title, 1: Start, 2: End
}

pub struct App {
    pub planner: Planner,
    pub templates: Vec<Template>,
    pub state: TableState,
    pub template_state: TableState,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub target_id: Option<String>,
    pub add_state: AddState,
    pub todo_cursor: usize,
    pub ring: Ring,
    /// Where the dial was last drawn, for mapping mouse clicks.
    pub dial_area: Rect,
    pub minute: u32,
    pub ticker: MinuteTicker,
    pub pomodoro: Pomodoro,
    pub status: Option<String>,
}

impl App {
    pub fn new(planner: Planner) -> App {
        let pomodoro = Pomodoro::new(planner.pomodoro_settings());
        let mut app = App {
            planner,
            templates: Vec::new(),
            state: TableState::default(),
            template_state: TableState::default(),
            view_mode: ViewMode::Dial,
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            target_id: None,
            add_state: AddState::default(),
            todo_cursor: 0,
            ring: Ring::new(Point::new(DIAL_SIZE / 2.0, DIAL_SIZE / 2.0), 290.0, 70.0),
            dial_area: Rect::default(),
            minute: current_minute_of_day(),
            ticker: MinuteTicker::new(),
            pomodoro,
            status: None,
        };
        app.reload();
        app
    }

    /// Applies today's saved schedule, if any, and reports what happened.
    pub fn start_session(&mut self) {
        let result = self.planner.start_session_now();
        match result {
            Ok(SessionStart::Schedule(day)) => self.status = Some(format!("Loaded {}'s schedule", day_name(day))),
            Ok(SessionStart::Template(_)) => {}
            Err(e) => self.fail(e),
        }
        self.reload();
        self.select_active();
    }

    /// Moves the clock hand when the wall-clock minute changes.
    pub fn poll_clock<T: Timelike>(&mut self, now: &T) -> bool {
        match self.ticker.poll(now) {
            Some(minute) => {
                self.minute = minute;
                true
            }
            None => false,
        }
    }

    /// Advances the pomodoro timer by whole seconds.
    pub fn on_tick(&mut self, secs: u32) {
        if let Some(mode) = self.pomodoro.tick(secs) {
            self.status = Some(format!("{} time", mode.label()));
        }
    }

    pub fn blocks(&self) -> &[RoutineBlock] {
        self.planner.blocks.list()
    }

    pub fn selected_block(&self) -> Option<&RoutineBlock> {
        self.state.selected().and_then(|i| self.blocks().get(i))
    }

    pub fn next(&mut self) {
        let (len, state) = self.current_list();
        if len == 0 { return; }
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
        self.todo_cursor = 0;
    }

    pub fn previous(&mut self) {
        let (len, state) = self.current_list();
        if len == 0 { return; }
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
        self.todo_cursor = 0;
    }

    fn current_list(&mut self) -> (usize, &mut TableState) {
        match self.view_mode {
            ViewMode::Dial => (self.planner.blocks.list().len(), &mut self.state),
            ViewMode::Templates => (self.templates.len(), &mut self.template_state),
        }
    }

    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Dial => ViewMode::Templates,
            ViewMode::Templates => ViewMode::Dial,
        };
    }

    /// Selects the block under the clock hand.
    pub fn select_active(&mut self) {
        let idx = self.blocks().iter().position(|b| b.contains(self.minute));
        if idx.is_some() {
            self.state.select(idx);
            self.todo_cursor = 0;
        }
    }

    pub fn select_block(&mut self, id: &str) {
        if let Some(i) = self.blocks().iter().position(|b| b.id == id) {
            self.state.select(Some(i));
            self.todo_cursor = 0;
        }
    }

    /// Maps a terminal cell inside the dial to dial coordinates.
    pub fn dial_point(&self, column: u16, row: u16) -> Option<Point> {
        let a = self.dial_area;
        if a.width == 0 || a.height == 0 {
            return None;
        }
        if column < a.x || row < a.y || column >= a.x + a.width || row >= a.y + a.height {
            return None;
        }
        let x = (column - a.x) as f64 + 0.5;
        let y = (row - a.y) as f64 + 0.5;
        Some(Point::new(x / a.width as f64 * DIAL_SIZE, y / a.height as f64 * DIAL_SIZE))
    }

    /// Left click on the dial: select the block there, or start a new
    /// block at the nearest half hour when the ring is empty there.
    pub fn click(&mut self, column: u16, row: u16) {
        if self.view_mode != ViewMode::Dial || self.input_mode != InputMode::Normal {
            return;
        }
        let Some(point) = self.dial_point(column, row) else { return };
        let hit = hit_test(point, &self.ring, self.planner.blocks.list());
        let block_id = hit.block_id().map(str::to_string);
        let empty_at = match hit {
            Hit::EmptySlot(minute) => Some(minute),
            _ => None,
        };
        if let Some(id) = block_id {
            self.select_block(&id);
        } else if let Some(minute) = empty_at {
            self.start_add_at(new_block_start(minute));
        }
    }

    /// Reloads the template list and keeps selections in range.
    pub fn reload(&mut self) {
        self.templates = self.planner.templates.list_all().into_iter().cloned().collect();
        clamp_selection(&mut self.state, self.planner.blocks.list().len());
        clamp_selection(&mut self.template_state, self.templates.len());
        let todos = self.selected_block().map_or(0, |b| b.todos.len());
        if self.todo_cursor >= todos {
            self.todo_cursor = todos.saturating_sub(1);
        }
    }

    pub fn start_add(&mut self) {
        self.start_add_at(new_block_start(self.minute));
    }

    pub fn start_add_at(&mut self, start: u32) {
        self.input_mode = InputMode::Adding;
        self.add_state = AddState { start: format_hhmm(start), ..AddState::default() };
        self.input_buffer.clear();
    }

    /// Opens the input box for one field of the selected block.
    pub fn start_edit(&mut self, field: InputField) {
        let prefill = match (&field, self.selected_block()) {
            (InputField::Title, Some(b)) => b.title.clone(),
            (InputField::Start, Some(b)) => format_hhmm(b.start_minute),
            (InputField::End, Some(b)) => format_hhmm(b.end_minute),
            (InputField::Todo, Some(_)) => String::new(),
            (InputField::TemplateName, _) => String::new(),
            _ => return,
        };
        self.target_id = self.selected_block().map(|b| b.id.clone());
        self.input_mode = InputMode::Editing;
        self.input_field = field;
        self.input_buffer = prefill;
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_field = InputField::None;
        self.input_buffer.clear();
    }

    pub fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(),
            InputMode::Editing => self.handle_editing_input(),
            InputMode::Normal => {}
        }
    }

    fn handle_adding_input(&mut self) {
        match self.add_state.step {
            0 => {
                let title = self.input_buffer.trim();
                if title.is_empty() {
                    self.status = Some("Please enter a title".into());
                    return;
                }
                self.add_state.title = title.to_string();
                self.input_buffer = self.add_state.start.clone();
                self.add_state.step += 1;
            }
            1 => {
                let start = match parse_range(&self.input_buffer, "24:00") {
                    Ok((s, _)) => s,
                    Err(e) => return self.fail(e),
                };
                self.add_state.start = format_hhmm(start);
                self.input_buffer = format_hhmm((start + DEFAULT_BLOCK_MINUTES).min(MINUTES_PER_DAY));
                self.add_state.step += 1;
            }
            _ => {
                let (start, end) = match parse_range(&self.add_state.start, &self.input_buffer) {
                    Ok(r) => r,
                    Err(e) => return self.fail(e),
                };
                let block = RoutineBlock::new(self.add_state.title.clone(), COLOR_PALETTE[0], start, end);
                let id = block.id.clone();
                match self.planner.blocks.add(block) {
                    Ok(()) => {
                        self.reload();
                        self.select_block(&id);
                    }
                    Err(e) => self.fail(e),
                }
                self.cancel_input();
            }
        }
    }

    fn handle_editing_input(&mut self) {
        let value = self.input_buffer.trim().to_string();
        let result = match self.input_field {
            InputField::TemplateName => self.save_template(&value),
            field => match self.target_id.clone() {
                Some(id) => self.edit_block(&id, field, &value),
                None => Ok(()),
            },
        };
        match result {
            Ok(()) => self.cancel_input(),
            // Keep the box open so the value can be fixed.
            Err(e) => self.fail(e),
        }
        self.reload();
    }

    fn edit_block(&mut self, id: &str, field: InputField, value: &str) -> Result<()> {
        let Some(block) = self.planner.blocks.get(id) else { return Ok(()) };
        let patch = match field {
            InputField::Title if !value.is_empty() => BlockPatch { title: Some(value.to_string()), ..Default::default() },
            InputField::Start | InputField::End => {
                let (start, end) = if field == InputField::Start {
                    (value.to_string(), format_hhmm(block.end_minute))
                } else {
                    (format_hhmm(block.start_minute), value.to_string())
                };
                let (start, end) = parse_range(&start, &end)?;
                BlockPatch { start_minute: Some(start), end_minute: Some(end), ..Default::default() }
            }
            InputField::Todo if !value.is_empty() => {
                self.planner.blocks.add_todo(id, value)?;
                return Ok(());
            }
            _ => return Ok(()),
        };
        self.planner.blocks.update(id, patch)?;
        Ok(())
    }

    fn save_template(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Ok(());
        }
        let blocks = self.blocks().to_vec();
        let template = self.planner.templates.create_from_current_blocks(name, &blocks)?;
        self.status = Some(format!("Saved template '{}'", template.name));
        Ok(())
    }

    /// Gives the selected block the next palette color.
    pub fn cycle_color(&mut self) {
        let Some(block) = self.selected_block() else { return };
        let next = COLOR_PALETTE
            .iter()
            .position(|c| c.eq_ignore_ascii_case(&block.color))
            .map_or(0, |i| (i + 1) % COLOR_PALETTE.len());
        let id = block.id.clone();
        let patch = BlockPatch { color: Some(COLOR_PALETTE[next].to_string()), ..Default::default() };
        if let Err(e) = self.planner.blocks.update(&id, patch) {
            self.fail(e);
        }
    }

    pub fn next_todo(&mut self) {
        let len = self.selected_block().map_or(0, |b| b.todos.len());
        if len > 0 {
            self.todo_cursor = (self.todo_cursor + 1) % len;
        }
    }

    pub fn toggle_todo(&mut self) {
        let Some((block_id, todo_id)) = self.cursor_todo() else { return };
        if let Err(e) = self.planner.blocks.toggle_todo(&block_id, &todo_id) {
            self.fail(e);
        }
    }

    pub fn remove_todo(&mut self) {
        let Some((block_id, todo_id)) = self.cursor_todo() else { return };
        if let Err(e) = self.planner.blocks.remove_todo(&block_id, &todo_id) {
            self.fail(e);
        }
        self.reload();
    }

    fn cursor_todo(&self) -> Option<(String, String)> {
        let block = self.selected_block()?;
        let todo = block.todos.get(self.todo_cursor)?;
        Some((block.id.clone(), todo.id.clone()))
    }

    /// Deletes the selected block, or removes the selected template.
    pub fn delete_selected(&mut self) {
        match self.view_mode {
            ViewMode::Dial => {
                let Some(id) = self.selected_block().map(|b| b.id.clone()) else { return };
                if let Err(e) = self.planner.blocks.delete(&id) {
                    self.fail(e);
                }
            }
            ViewMode::Templates => {
                let Some(id) = self.selected_template_id() else { return };
                if let Err(e) = self.remove_template(&id) {
                    self.fail(e);
                }
            }
        }
        self.reload();
    }

    fn remove_template(&mut self, id: &str) -> Result<()> {
        if self.planner.templates.remove(id)? && self.planner.templates.current_id() == id {
            self.planner.templates.switch_to_surviving(&mut self.planner.blocks)?;
        }
        self.status = Some(if is_built_in(id) {
            format!("Hid '{}' (restore with u)", id)
        } else {
            format!("Removed '{}'", id)
        });
        Ok(())
    }

    /// Brings back every hidden built-in template.
    pub fn restore_templates(&mut self) {
        for t in built_in_templates() {
            if let Err(e) = self.planner.templates.restore(&t.id) {
                self.fail(e);
                return;
            }
        }
        self.reload();
    }

    fn selected_template_id(&self) -> Option<String> {
        self.template_state.selected().and_then(|i| self.templates.get(i)).map(|t| t.id.clone())
    }

    /// Loads the selected template as today's blocks and returns to the dial.
    pub fn use_selected_template(&mut self) {
        let Some(id) = self.selected_template_id() else { return };
        match self.planner.templates.switch_to(&id, &mut self.planner.blocks) {
            Ok(_) => {
                self.status = Some(format!("Switched to '{}'", id));
                self.view_mode = ViewMode::Dial;
                self.state.select(None);
                self.reload();
                self.select_active();
            }
            Err(e) => self.fail(e),
        }
    }

    /// Saves today's blocks as the schedule for the current weekday.
    pub fn save_today_schedule(&mut self) {
        let day = today_weekday();
        let blocks = self.blocks().to_vec();
        match self.planner.schedules.save(day, &blocks) {
            Ok(()) => self.status = Some(format!("Saved schedule for {}", day_name(day))),
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, e: crate::error::Error) {
        warn!(error = %e, "action failed");
        self.status = Some(e.to_string());
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else if let Some(i) = state.selected() {
        if i >= len {
            state.select(Some(len - 1));
        }
    } else {
        state.select(Some(0));
    }
}
