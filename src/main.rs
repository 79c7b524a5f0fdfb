//! earthview: a terminal overlay showing the freshest view of Earth.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌───────────┐  FeedMsg   ┌──────────┐  draw()  ┌──────────┐
//! │ engine/   │ ─────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (task)    │  (channel) │ (state)  │          │ (render) │
//! └───────────┘            └──────────┘          └──────────┘
//!       ▲                       ▲
//!       │ SessionHandle         │ handle_key_event()
//!       └──── Action ───── ┌──────────┐
//!                          │ input.rs │
//!                          └──────────┘
//! ```
//!
//! * **`engine/`**: the acquisition engine.  A session controller task that
//!   drives either the retrying image fetcher or the stream failover
//!   sequencer.
//! * **`source/`**: upstream source descriptions and the HTTP and stream
//!   collaborators the engine talks through.
//! * **`cache`**: the single-slot TTL cache for image metadata.
//! * **`app`**: overlay state (visibility, current view, last error).
//! * **`ui`**: pure rendering: reads `App` state and draws widgets.
//! * **`input`**: maps key events to `App` mutations and engine actions.
//! * **`main`**: wires everything together: parse args, start logging and
//!   the engine, set up the terminal, and run the event loop.

mod app;
mod cache;
mod config;
mod engine;
mod error;
mod input;
mod logging;
mod source;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;

use app::{Action, App};
use config::{EngineConfig, PROBE_INTERVAL};
use engine::Mode;
use source::{HttpClient, ProbePlayer};

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before printing a panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    install_panic_hook();

    // -- parse arguments -----------------------------------------------------
    let mode = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<Mode>()?,
        None => Mode::Image,
    };

    let _log_guard = logging::init_logging(logging::default_log_dir(), "info")?;
    info!(%mode, "starting earthview");

    // -- start the engine ----------------------------------------------------
    // The UI loop below stays on this thread; the engine and its timers run
    // on the runtime's worker threads.
    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let _enter = runtime.enter();

    let config = EngineConfig::default();
    let client = Arc::new(HttpClient::new()?);
    let player = Box::new(ProbePlayer::new(PROBE_INTERVAL));
    let (session, mut rx) = engine::spawn(&config, client, player);

    // -- terminal setup (RAII: Drop restores on exit or panic) ---------------
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(mode);

    let dispatch = |action: Action| match action {
        Action::Acquire(mode) => session.acquire(mode),
        Action::Retry => session.retry(),
    };

    // Open the overlay straight away.
    if let Some(action) = app.toggle() {
        dispatch(action);
    }

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Drain any messages from the engine.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        while let Ok(msg) = rx.try_recv() {
            app.apply(msg);
        }

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if let Some(action) = input::handle_key_event(&mut app, key) {
                    dispatch(action);
                }
            }
        }

        if app.quit {
            break;
        }
    }

    session.shutdown();
    info!("exiting");
    Ok(())
}
