use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Line as TextLine,
    widgets::{
        canvas::{Canvas, Circle, Line, Points},
        Block, Borders, Cell, Clear, Paragraph, Row, Table,
    },
    Frame,
};
use crate::geometry::{point_on_ring, Point, Ring};
use crate::models::{hex_rgb, RoutineBlock};
use crate::timemath::format_hhmm;
use super::app::{App, InputField, InputMode, ViewMode, DIAL_SIZE};

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Body
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)].as_ref())
        .split(chunks[0]);

    draw_dial(f, app, body[0]);

    match app.view_mode {
        ViewMode::Dial => draw_blocks(f, app, body[1]),
        ViewMode::Templates => draw_templates(f, app, body[1]),
    }

    let help_text = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::Dial => "q: Quit | a: Add | e: Title | s: Start | f: End | c: Color | d: Del | o: Todo | Tab/Space/x: Todos | w: Save Day | p/n/r: Pomodoro | v: Templates",
            ViewMode::Templates => "q: Quit | Enter: Use | a: Save Current | d: Del | u: Restore Built-ins | v: Dial",
        },
        InputMode::Editing => "Enter: Save | Esc: Cancel",
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
    };
    let help = match &app.status {
        Some(status) => Paragraph::new(status.as_str()).style(Style::default().fg(Color::Yellow)),
        None => Paragraph::new(help_text).style(Style::default().fg(Color::Gray)),
    };
    f.render_widget(help.block(Block::default().borders(Borders::ALL)), chunks[1]);

    // Render Input Box if needed
    if app.input_mode != InputMode::Normal {
        let area = centered_rect(60, 3, f.area());
        f.render_widget(Clear, area);

        let title = match app.input_mode {
            InputMode::Adding => match app.add_state.step {
                0 => "Add Block: Enter Title",
                1 => "Add Block: Start (HH:MM)",
                _ => "Add Block: End (HH:MM, 24:00 for midnight)",
            },
            _ => match app.input_field {
                InputField::Title => "Edit Title",
                InputField::Start => "Edit Start (HH:MM)",
                InputField::End => "Edit End (HH:MM)",
                InputField::Todo => "Add Todo",
                InputField::TemplateName => "Save Template: Enter Name",
                InputField::None => "Edit",
            },
        };

        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(input, area);
    }
}

fn block_color(block: &RoutineBlock) -> Color {
    match hex_rgb(&block.color) {
        Some((r, g, b)) => Color::Rgb(r, g, b),
        None => Color::White,
    }
}

/// Canvas y grows upward; dial y grows downward.
fn canvas_point(p: Point) -> (f64, f64) {
    (p.x, DIAL_SIZE - p.y)
}

/// Dots filling the annular sector of `[start, end)`.
fn sector_points(start: u32, end: u32, ring: &Ring) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    let mut radius = ring.inner_radius();
    while radius <= ring.outer_radius {
        let mut minute = start as f64;
        while minute < end as f64 {
            points.push(canvas_point(point_on_ring(minute, radius, ring.center)));
            minute += 2.0;
        }
        radius += 4.0;
    }
    points
}

fn draw_dial(f: &mut Frame, app: &mut App, area: Rect) {
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(format!("dayring - {}", format_hhmm(app.minute)));
    app.dial_area = outer.inner(area);

    let ring = app.ring;
    let minute = app.minute;
    let blocks = app.blocks();
    let selected = app.selected_block().map(|b| b.id.clone());
    let (cx, cy) = canvas_point(ring.center);

    let canvas = Canvas::default()
        .block(outer)
        .marker(Marker::Braille)
        .x_bounds([0.0, DIAL_SIZE])
        .y_bounds([0.0, DIAL_SIZE])
        .paint(|ctx| {
            ctx.draw(&Circle { x: cx, y: cy, radius: ring.outer_radius, color: Color::DarkGray });
            ctx.draw(&Circle { x: cx, y: cy, radius: ring.inner_radius(), color: Color::DarkGray });
            for block in blocks {
                let points = sector_points(block.start_minute, block.end_minute, &ring);
                ctx.draw(&Points { coords: &points, color: block_color(block) });
            }
            ctx.layer();

            if let Some(block) = blocks.iter().find(|b| Some(&b.id) == selected.as_ref()) {
                let edge = Ring::new(ring.center, ring.outer_radius + 8.0, 0.0);
                let points = sector_points(block.start_minute, block.end_minute, &edge);
                ctx.draw(&Points { coords: &points, color: Color::White });
            }

            for hour in 0..24u32 {
                let len = if hour % 6 == 0 { 30.0 } else { 12.0 };
                let r = ring.inner_radius() - 6.0;
                let (x1, y1) = canvas_point(point_on_ring((hour * 60) as f64, r, ring.center));
                let (x2, y2) = canvas_point(point_on_ring((hour * 60) as f64, r - len, ring.center));
                ctx.draw(&Line::new(x1, y1, x2, y2, Color::Gray));
            }
            for hour in [0u32, 6, 12, 18] {
                let (x, y) = canvas_point(point_on_ring((hour * 60) as f64, ring.inner_radius() - 60.0, ring.center));
                ctx.print(x - 8.0, y, format!("{:02}", hour));
            }

            let (hx, hy) = canvas_point(point_on_ring(minute as f64, ring.outer_radius, ring.center));
            ctx.draw(&Line::new(cx, cy, hx, hy, Color::Red));
        });
    f.render_widget(canvas, area);
}

fn draw_blocks(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(10), Constraint::Length(3)].as_ref())
        .split(area);

    let minute = app.minute;
    let rows: Vec<Row> = app
        .blocks()
        .iter()
        .map(|b| {
            let done = b.todos.iter().filter(|t| t.completed).count();
            let style = if b.contains(minute) {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from("██").style(Style::default().fg(block_color(b))),
                Cell::from(format!("{}-{}", format_hhmm(b.start_minute), format_hhmm(b.end_minute))),
                Cell::from(b.title.clone()),
                Cell::from(if b.todos.is_empty() { String::new() } else { format!("{}/{}", done, b.todos.len()) }),
            ]).style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Length(11),
        Constraint::Min(10),
        Constraint::Length(5),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["", "Time", "Title", "Todos"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title("Blocks"))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");
    f.render_stateful_widget(table, chunks[0], &mut app.state);

    let (title, todos): (String, Vec<TextLine>) = match app.selected_block() {
        Some(b) => (
            format!("Todos - {}", b.title),
            b.todos
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    let cursor = if i == app.todo_cursor { ">" } else { " " };
                    let text = format!("{} [{}] {}", cursor, if t.completed { "x" } else { " " }, t.text);
                    if t.completed {
                        TextLine::styled(text, Style::default().fg(Color::DarkGray))
                    } else {
                        TextLine::from(text)
                    }
                })
                .collect(),
        ),
        None => ("Todos".to_string(), Vec::new()),
    };
    f.render_widget(Paragraph::new(todos).block(Block::default().borders(Borders::ALL).title(title)), chunks[1]);

    let p = &app.pomodoro;
    let timer = format!(
        "{} {}{}  (#{} done)",
        p.mode.label(),
        p.remaining_label(),
        if p.running { "" } else { " paused" },
        p.completed,
    );
    f.render_widget(Paragraph::new(timer).block(Block::default().borders(Borders::ALL).title("Pomodoro")), chunks[2]);
}

fn draw_templates(f: &mut Frame, app: &mut App, area: Rect) {
    let current = app.planner.templates.current_id().to_string();
    let rows: Vec<Row> = app
        .templates
        .iter()
        .map(|t| {
            Row::new(vec![
                Cell::from(t.name.clone()),
                Cell::from(t.blocks.len().to_string()),
                Cell::from(if app.planner.templates.is_built_in(&t.id) { "built-in" } else { "custom" }),
                Cell::from(if t.id == current { "*" } else { "" }),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(16),
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Length(1),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["Name", "Blocks", "Kind", ""])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title("Templates"))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");
    f.render_stateful_widget(table, area, &mut app.template_state);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(r.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Length(r.height.saturating_sub(height) / 2),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
