//! Interactive terminal view.
//!
//! Renders the session and forwards keyboard and mouse input into it. Network
//! work runs on the dispatcher; results come back over a channel that is
//! drained on every tick of the UI loop.

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self as crossterm_event, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use weather_core::{Dispatcher, Services, Units};

mod app;
mod ui;

use app::App;

pub async fn run(services: Services, units: Units) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let mut app = App::new(Dispatcher::new(services, tx), rx, units);
    let result = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    app.start();

    while !app.should_quit {
        let frame = terminal.draw(|f| ui::render(f, app))?;
        app.set_screen(frame.area);

        if crossterm_event::poll(Duration::from_millis(16))? {
            match crossterm_event::read()? {
                Event::Key(key) => app.handle_key(key),
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }

        app.drain_updates();
        tokio::task::yield_now().await;
    }

    Ok(())
}
