pub mod app;
pub mod ui;

use std::{error::Error, io};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::dates::Clock;
use crate::session::Session;
use app::{App, InputField, InputMode, Popup};
use ui::ui;

/// Runs the interactive view on the logged-in session. The caller logs out
/// afterwards, which writes the tasks back.
pub fn run_tui<C: Clock + Clone>(session: &mut Session<C>, horizon: i64) -> Result<(), Box<dyn Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, horizon);
    if app.store().is_some_and(|s| !s.reminders(horizon).is_empty()) {
        app.popup = Some(Popup::Reminders);
    }

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: Backend, C: Clock + Clone>(terminal: &mut Terminal<B>, app: &mut App<'_, C>) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match app.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Esc => app.clear_filter(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Char(' ') => app.complete_selected(),
                KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
                KeyCode::Char('a') => app.start_add(),
                KeyCode::Char('n') => app.start_edit(InputField::Description),
                KeyCode::Char('p') => app.start_edit(InputField::Priority),
                KeyCode::Char('t') => app.start_edit(InputField::Due), // 't' for Time/Date
                KeyCode::Char('g') => app.start_edit(InputField::Category),
                KeyCode::Char('u') => app.undo(),
                KeyCode::Char('s') => app.cycle_order(),
                KeyCode::Char('/') => app.start_search(),
                KeyCode::Char('i') => app.toggle_popup(Popup::Statistics),
                KeyCode::Char('r') => app.toggle_popup(Popup::Reminders),
                _ => {}
            },
            InputMode::Editing | InputMode::Adding | InputMode::Searching => match key.code {
                KeyCode::Enter => app.handle_input(),
                KeyCode::Esc => app.cancel_input(),
                KeyCode::Char(c) => app.input_buffer.push(c),
                KeyCode::Backspace => {
                    app.input_buffer.pop();
                }
                _ => {}
            },
        }
    }
}
