//! Terminal rendering and event loop for iaseek.
//!
//! Handles setup/teardown of raw mode, alternate screen, redraws,
//! and events (keypress, resize) to app logic. While a download runs the loop is parked
//! inside [AppState::dispatch]; the [TerminalMonitor] then owns the screen and the keyboard.

use crate::app::keymap::DownloadKeys;
use crate::app::{AppState, Command, Flow, KeypressResult, View};
use crate::config::Display;
use crate::core::download::{DownloadMonitor, Keystroke};
use crate::ui;

use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use std::{io, time::Duration};
use tracing::{debug, warn};

/// Lines of backend output kept for the download panel.
const LOG_CAPACITY: usize = 500;

/// Initializes the terminal in raw mode and alternate sceen and runs the main event loop.
///
/// Blocks until quit. Handles all input and UI rendering.
///
/// Returns an std::io::Error if terminal setup or teardown fails.
pub fn run_terminal(app: &mut AppState) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, Show)?;
    result
}

/// Main event loop of iaseek: draws UI, polls for events and dispatches them to the app.
/// Returns on quit
fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut AppState) -> io::Result<()>
where
    io::Error: From<<B as Backend>::Error>,
{
    loop {
        let expired = app.tick();
        if app.take_redraw() || expired {
            terminal.draw(|f| ui::render(f, app))?;
        }

        if !event::poll(Duration::from_millis(16))? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match app.handle_keypress(key) {
                KeypressResult::Quit => break,
                KeypressResult::Command(cmd) => {
                    if run_command(terminal, app, cmd)? == Flow::Quit {
                        break;
                    }
                }
                KeypressResult::Continue | KeypressResult::Consumed => {}
            },
            Event::Resize(_, _) => app.request_redraw(),
            _ => {}
        }
    }
    Ok(())
}

/// Dispatches `cmd` with a monitor that can take over the screen for a download.
fn run_command<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut AppState,
    cmd: Command,
) -> io::Result<Flow>
where
    io::Error: From<<B as Backend>::Error>,
{
    let title = match app.session().view() {
        View::FileAction(_, info) => info.name().to_string(),
        _ => String::new(),
    };
    let keys = app.config().keys();
    let hint = format!(
        "{}: cancel download   {}: cancel and quit",
        keys.cancel().join("/"),
        keys.quit().join("/"),
    );

    let mut monitor = TerminalMonitor::new(
        terminal,
        app.keymap().download_keys().clone(),
        app.config().display().clone(),
        title,
        hint,
    );
    let flow = app.dispatch(cmd, &mut monitor);

    if let Some(e) = monitor.error.take() {
        return Err(e);
    }
    if monitor.drawn {
        // The panel covered the whole screen.
        terminal.clear()?;
    }
    Ok(flow)
}

/// Shows download output on the terminal and reads interrupt keys without blocking.
pub struct TerminalMonitor<'t, B: Backend> {
    terminal: &'t mut Terminal<B>,
    keys: DownloadKeys,
    display: Display,
    title: String,
    hint: String,
    lines: Vec<String>,
    drawn: bool,
    error: Option<io::Error>,
}

impl<'t, B: Backend> TerminalMonitor<'t, B> {
    pub fn new(
        terminal: &'t mut Terminal<B>,
        keys: DownloadKeys,
        display: Display,
        title: String,
        hint: String,
    ) -> Self {
        Self {
            terminal,
            keys,
            display,
            title,
            hint,
            lines: Vec::new(),
            drawn: false,
            error: None,
        }
    }

    fn redraw(&mut self) {
        let (display, title, hint, lines) = (&self.display, &self.title, &self.hint, &self.lines);
        let result = self
            .terminal
            .draw(|f| ui::widgets::draw_download_panel(f, display, title, hint, lines))
            .map(|_| ());

        match result {
            Ok(_) => self.drawn = true,
            Err(e) => self.record(io::Error::other(e.to_string())),
        }
    }

    /// Keeps the first terminal error; later ones are only logged.
    fn record(&mut self, e: io::Error) {
        warn!(error = %e, "terminal error during download");
        if self.error.is_none() {
            self.error = Some(e);
        }
    }
}

impl<B: Backend> DownloadMonitor for TerminalMonitor<'_, B> {
    fn poll_interrupt(&mut self) -> Option<Keystroke> {
        if !self.drawn {
            self.redraw();
        }

        match event::poll(Duration::ZERO) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                self.record(e);
                return None;
            }
        }

        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                let hit = self.keys.lookup(key);
                if let Some(stroke) = hit {
                    debug!(?stroke, "download interrupt key");
                }
                hit
            }
            Ok(Event::Resize(_, _)) => {
                self.redraw();
                None
            }
            Ok(_) => None,
            Err(e) => {
                self.record(e);
                None
            }
        }
    }

    fn emit(&mut self, line: &str) {
        self.lines.push(line.to_string());
        if self.lines.len() > LOG_CAPACITY {
            let excess = self.lines.len() - LOG_CAPACITY;
            self.lines.drain(..excess);
        }
        self.redraw();
    }
}
