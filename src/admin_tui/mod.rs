//! Admin Terminal User Interface (TUI)
//!
//! Screens for every backend resource plus a dashboard, built from reusable
//! components over the page, form and table layers.

pub mod app;
pub mod components;
pub mod screens;
pub mod traits;
pub mod ui;

use std::io;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

pub use app::{App, AppContext, Screen};

/// Take over the terminal until the user quits
pub async fn run_tui(ctx: AppContext) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!("Starting admin TUI");
    let mut app = App::new(ctx);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    match &result {
        Ok(()) => info!("Admin TUI exited successfully"),
        Err(e) => error!("Admin TUI encountered an error: {}", e),
    }
    result
}
