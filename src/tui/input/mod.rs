mod confirm;
mod filters;
mod form;
mod navigate;
mod search;

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};

use super::app::{App, Mode};

use confirm::handle_confirm;
use filters::handle_filter_picker;
use form::handle_form;
use navigate::handle_navigate;
use search::handle_search;

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent, now: Instant) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }

    // Recovery screen intercepts all input
    if app.recovery.is_some() {
        handle_recovery(app, key);
        return;
    }

    match app.mode {
        Mode::Navigate => handle_navigate(app, key),
        Mode::Search => handle_search(app, key, now),
        Mode::Filter => handle_filter_picker(app, key),
        Mode::Form => handle_form(app, key),
        Mode::Confirm => handle_confirm(app, key),
    }
    app.sync_dirty();
}

fn handle_recovery(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => app.reload_after_recovery(),
        KeyCode::Char('h') | KeyCode::Esc => app.go_home(),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    pub(crate) fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    pub(crate) fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Feed a sequence of plain keys
    pub(crate) fn press(app: &mut App, codes: &[KeyCode]) {
        for code in codes {
            handle_key(app, key(*code), Instant::now());
        }
    }

    pub(crate) fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_key(app, key(KeyCode::Char(c)), Instant::now());
        }
    }

    #[test]
    fn recovery_screen_swallows_keys() {
        let mut app = crate::tui::app::tests::test_app();
        app.recover("boom".into());
        press(&mut app, &[KeyCode::Char('n')]);
        assert!(app.form.is_none());
        assert!(app.recovery.is_some());

        press(&mut app, &[KeyCode::Char('r')]);
        assert!(app.recovery.is_none());
        assert_eq!(app.mode, Mode::Navigate);
    }

    #[test]
    fn modifier_keys_are_ignored() {
        let mut app = crate::tui::app::tests::test_app();
        app.recover("boom".into());
        handle_key(
            &mut app,
            key(KeyCode::Modifier(crossterm::event::ModifierKeyCode::LeftShift)),
            Instant::now(),
        );
        assert!(app.recovery.is_some());
    }
}
