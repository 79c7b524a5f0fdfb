//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  Keys that need the engine
//! return an [`Action`] for the main loop to forward.
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a method on [`App`] for the action (if one doesn't exist).
//! 2. Add a `KeyCode` match arm in [`handle_key_event`] that calls it.
//! 3. Update the help text in `ui::draw_help_bar`.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::{Action, App};

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.quit = true;
            None
        }
        KeyCode::Char(' ') | KeyCode::Enter => app.toggle(),
        KeyCode::Char('r') => app.request_retry(),
        _ => None,
    }
}
