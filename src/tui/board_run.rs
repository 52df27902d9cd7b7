//! Board TUI entry point and terminal setup.

use std::io;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};

use crate::config::Config;
use crate::db::{FileSlot, TaskStore};
use crate::tui::board::BoardApp;

/// Initialise the terminal and run the board until the user quits.
/// With `focus` set, the focus overlay opens on that task straight away.
pub fn run_board(store: TaskStore<FileSlot>, config: Config, focus: Option<&str>) -> io::Result<()> {
    let mut app = match focus {
        Some(id) => BoardApp::with_focus(store, config, id),
        None => BoardApp::new(store, config),
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}
