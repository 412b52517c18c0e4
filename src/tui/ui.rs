use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use super::app::{App, InputField, InputMode, Popup};
use crate::commands::{status_label, ListOrder};
use crate::dates::Clock;
use crate::models::Priority;

pub fn ui<C: Clock + Clone>(f: &mut Frame, app: &mut App<'_, C>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Table
            Constraint::Length(1), // Message
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    let (today, positions): (_, Vec<usize>) = match app.store() {
        Some(store) => (
            store.today(),
            app.rows
                .iter()
                .map(|t| store.position_of(t.id).unwrap_or_default())
                .collect(),
        ),
        None => (chrono::Local::now().date_naive(), Vec::new()),
    };

    let rows: Vec<Row> = app
        .rows
        .iter()
        .zip(positions)
        .map(|(t, n)| {
            let status = status_label(t, today, app.horizon);
            let style = match status {
                "Done" => Style::default().fg(Color::DarkGray),
                "OVERDUE" => Style::default().fg(Color::Red),
                "Due soon" => Style::default().fg(Color::Yellow),
                _ if t.priority == Priority::High => Style::default().fg(Color::LightMagenta),
                _ => Style::default(),
            };
            Row::new(vec![
                Cell::from(n.to_string()),
                Cell::from(if t.completed { "[✓]" } else { "[ ]" }),
                Cell::from(t.description.clone()),
                Cell::from(t.priority.to_string()),
                Cell::from(t.due_date.to_string()),
                Cell::from(t.category.clone()),
                Cell::from(t.recurrence.map(|r| r.to_string()).unwrap_or_default()),
                Cell::from(status),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Min(20),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Length(9),
    ];

    let order = match app.order {
        ListOrder::Inserted => "as entered",
        ListOrder::DueDate => "by due date",
        ListOrder::Priority => "by priority",
    };
    let mut title = format!(
        "Todoust - {} ({})",
        app.session.current_user().unwrap_or_default(),
        order
    );
    if let Some(filter) = &app.filter {
        title.push_str(&format!(" - matching '{}'", filter));
    }

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["#", "", "Description", "Priority", "Due", "Category", "Recurs", "Status"])
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, chunks[0], &mut app.state);

    let message = Paragraph::new(app.message.clone().unwrap_or_default())
        .style(Style::default().fg(Color::Yellow));
    f.render_widget(message, chunks[1]);

    let help_text = match app.input_mode {
        InputMode::Normal => "q: Quit | a: Add | n: Desc | p: Prio | t: Due | g: Cat | Space: Done | d: Del | u: Undo | s: Sort | /: Search | i: Stats | r: Reminders",
        InputMode::Editing | InputMode::Searching => "Enter: Save | Esc: Cancel",
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);

    if let Some(popup) = app.popup {
        render_popup(f, app, popup);
    }

    if app.input_mode != InputMode::Normal {
        let area = centered_rect(60, 3, f.area());
        f.render_widget(Clear, area);

        let title = match app.input_mode {
            InputMode::Adding => match app.add_state.step {
                0 => "Add Task: Enter Description",
                1 => "Add Task: Enter Priority (1 = High, 2 = Medium, 3 = Low)",
                2 => "Add Task: Enter Due Date (YYYY-MM-DD)",
                3 => "Add Task: Enter Category (Enter for 'General')",
                _ => "Add Task: Recurrence (daily/weekly/monthly, Enter for none)",
            },
            InputMode::Editing => match app.input_field {
                InputField::Description => "Edit Description",
                InputField::Priority => "Edit Priority (1-3)",
                InputField::Due => "Edit Due Date (YYYY-MM-DD)",
                InputField::Category => "Edit Category",
                InputField::None => "Edit",
            },
            InputMode::Searching => "Search Description",
            InputMode::Normal => "",
        };

        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(input, area);
    }
}

fn render_popup<C: Clock + Clone>(f: &mut Frame, app: &App<'_, C>, popup: Popup) {
    let Some(store) = app.store() else { return };
    let mut lines: Vec<Line> = Vec::new();
    let title = match popup {
        Popup::Statistics => {
            let stats = store.statistics();
            lines.push(Line::from(format!("Total Tasks: {}", stats.total)));
            lines.push(Line::from(format!(
                "Completed: {} ({}%)",
                stats.completed,
                stats.completion_percent()
            )));
            lines.push(Line::from(format!("Pending: {}", stats.pending)));
            lines.push(Line::from(format!("Overdue: {}", stats.overdue)));
            lines.push(Line::from(""));
            lines.push(Line::from(format!(
                "High: {}, Medium: {}, Low: {}",
                stats.by_priority.high, stats.by_priority.medium, stats.by_priority.low
            )));
            lines.push(Line::from(""));
            for (category, count) in &stats.by_category {
                lines.push(Line::from(format!("{}: {}", category, count)));
            }
            "Statistics"
        }
        Popup::Reminders => {
            let reminders = store.reminders(app.horizon);
            if reminders.is_empty() {
                lines.push(Line::from("No urgent tasks. Great job!"));
            }
            for (n, t) in &reminders.overdue {
                lines.push(Line::from(format!("OVERDUE  {}. {} (due {})", n, t.description, t.due_date)));
            }
            for (n, t) in &reminders.due_soon {
                lines.push(Line::from(format!("DUE SOON {}. {} (due {})", n, t.description, t.due_date)));
            }
            "Reminders"
        }
    };

    let height = u16::try_from(lines.len() + 2).unwrap_or(u16::MAX);
    let area = centered_rect(60, height, f.area());
    f.render_widget(Clear, area);
    let body = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(body, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let height = height.min(r.height);
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((r.height - height) / 2),
            Constraint::Length(height),
            Constraint::Length((r.height - height) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
