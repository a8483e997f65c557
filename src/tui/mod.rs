pub mod app;
pub mod ui;

use std::{error::Error, io, time::{Duration, Instant}};
use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::info;
use crate::session::Planner;
use app::{App, InputField, InputMode, ViewMode};
use ui::ui;

const TICK_RATE: Duration = Duration::from_secs(1);

pub fn run_tui() -> Result<(), Box<dyn Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state; today's schedule wins over the last template
    let mut app = App::new(Planner::open_default());
    app.start_session();

    // Run loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let mut last_tick = Instant::now();
    app.poll_clock(&Local::now());
    loop {
        terminal.draw(|f| ui(f, app))?;

        let until_minute = app.ticker.until_next_minute(&Local::now());
        let timeout = TICK_RATE.saturating_sub(last_tick.elapsed()).min(until_minute);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if !handle_key(app, key) {
                        app.ticker.stop();
                        info!("quit");
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => {
                    if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                        app.click(mouse.column, mouse.row);
                    }
                }
                _ => {}
            }
        }

        while last_tick.elapsed() >= TICK_RATE {
            app.on_tick(1);
            last_tick += TICK_RATE;
        }
        app.poll_clock(&Local::now());
    }
}

/// Returns `false` when the user asked to quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    match app.input_mode {
        InputMode::Normal => {
            app.status = None;
            match (app.view_mode, key.code) {
                (_, KeyCode::Char('q')) => return false,
                (_, KeyCode::Down | KeyCode::Char('j')) => app.next(),
                (_, KeyCode::Up | KeyCode::Char('k')) => app.previous(),
                (_, KeyCode::Char('v')) => app.toggle_view(),
                (_, KeyCode::Char('d') | KeyCode::Delete) => app.delete_selected(),
                (_, KeyCode::Char('p')) => app.pomodoro.toggle(),
                (_, KeyCode::Char('n')) => { app.pomodoro.skip(); }
                (_, KeyCode::Char('r')) => app.pomodoro.reset(),
                (ViewMode::Dial, KeyCode::Char('a')) => app.start_add(),
                (ViewMode::Dial, KeyCode::Char('e')) => app.start_edit(InputField::Title),
                (ViewMode::Dial, KeyCode::Char('s')) => app.start_edit(InputField::Start),
                (ViewMode::Dial, KeyCode::Char('f')) => app.start_edit(InputField::End),
                (ViewMode::Dial, KeyCode::Char('c')) => app.cycle_color(),
                (ViewMode::Dial, KeyCode::Char('o')) => app.start_edit(InputField::Todo),
                (ViewMode::Dial, KeyCode::Tab) => app.next_todo(),
                (ViewMode::Dial, KeyCode::Char(' ')) => app.toggle_todo(),
                (ViewMode::Dial, KeyCode::Char('x')) => app.remove_todo(),
                (ViewMode::Dial, KeyCode::Char('w')) => app.save_today_schedule(),
                (ViewMode::Dial, KeyCode::Char('.')) => app.select_active(),
                (ViewMode::Templates, KeyCode::Enter) => app.use_selected_template(),
                (ViewMode::Templates, KeyCode::Char('a')) => app.start_edit(InputField::TemplateName),
                (ViewMode::Templates, KeyCode::Char('u')) => app.restore_templates(),
                _ => {}
            }
        }
        InputMode::Editing | InputMode::Adding => match key.code {
            KeyCode::Enter => app.handle_input(),
            KeyCode::Esc => app.cancel_input(),
            KeyCode::Char(c) => {
                app.input_buffer.push(c);
            }
            KeyCode::Backspace => {
                app.input_buffer.pop();
            }
            _ => {}
        },
    }
    true
}
