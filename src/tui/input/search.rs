use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{App, Mode};
use crate::util::text::pop_grapheme;

/// Typing into the active tab's search box. The list refetches once the
/// debounce window has passed without further edits.
pub(super) fn handle_search(app: &mut App, key: KeyEvent, now: Instant) {
    let Some(tab) = app.current_tab_mut() else {
        app.mode = Mode::Navigate;
        return;
    };
    let mut text = tab.list.search_input().to_string();

    match (key.modifiers, key.code) {
        (_, KeyCode::Enter | KeyCode::Esc) => {
            app.mode = Mode::Navigate;
            return;
        }
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => text.clear(),
        (KeyModifiers::CONTROL, _) => return,
        (_, KeyCode::Backspace) => {
            if text.is_empty() {
                return;
            }
            pop_grapheme(&mut text);
        }
        (_, KeyCode::Char(c)) => text.push(c),
        _ => return,
    }

    tab.list.set_search_text(text, now);
    tab.cursor = 0;
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use crossterm::event::KeyCode;

    use crate::tui::app::Mode;
    use crate::tui::app::tests::test_app;
    use crate::tui::input::handle_key;
    use crate::tui::input::tests::{ctrl, press, type_str};

    #[test]
    fn typing_searches_after_the_debounce() {
        let mut app = test_app();
        press(&mut app, &[KeyCode::Char('/')]);
        assert_eq!(app.mode, Mode::Search);
        type_str(&mut app, "chair");
        assert_eq!(app.tabs[0].list.search_input(), "chair");

        app.tick(Instant::now());
        assert_eq!(app.tabs[0].list.total(), 1);

        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.dirty.is_key_dirty("products", "productFilters"));
    }

    #[test]
    fn backspace_and_clear() {
        let mut app = test_app();
        press(&mut app, &[KeyCode::Char('/')]);
        type_str(&mut app, "lap");
        press(&mut app, &[KeyCode::Backspace]);
        assert_eq!(app.tabs[0].list.search_input(), "la");

        handle_key(&mut app, ctrl('u'), Instant::now());
        assert_eq!(app.tabs[0].list.search_input(), "");
        app.tick(Instant::now());
        assert_eq!(app.tabs[0].list.total(), 3);
    }

    #[test]
    fn search_keys_do_not_trigger_navigation() {
        let mut app = test_app();
        press(&mut app, &[KeyCode::Char('/')]);
        type_str(&mut app, "q2");
        assert!(!app.should_quit);
        assert_eq!(app.tabs.len(), 1);
    }
}
