use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ops::validate::FormField;
use crate::tui::app::App;
use crate::util::text::pop_grapheme;

/// Fields plus the submit row
const FORM_ROWS: usize = FormField::ALL.len() + 1;

pub(super) fn handle_form(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (_, KeyCode::Esc) => app.request_close_form(),
        (KeyModifiers::CONTROL, KeyCode::Char('s')) => app.submit_form(),
        (_, KeyCode::Tab | KeyCode::Down) => move_focus(app, 1),
        (_, KeyCode::BackTab | KeyCode::Up) => move_focus(app, -1),
        (_, KeyCode::Enter) => {
            if app.form.as_ref().is_some_and(|f| f.on_submit_row()) {
                app.submit_form();
            } else {
                move_focus(app, 1);
            }
        }
        _ => edit_field(app, key),
    }
}

fn move_focus(app: &mut App, delta: isize) {
    if let Some(form) = app.form.as_mut() {
        form.focus = (form.focus as isize + delta).rem_euclid(FORM_ROWS as isize) as usize;
    }
}

fn edit_field(app: &mut App, key: KeyEvent) {
    let taxonomy = &app.taxonomy;
    let Some(form) = app.form.as_mut() else {
        return;
    };
    let Some(field) = form.focused_field() else {
        return;
    };

    if field.is_select() {
        match key.code {
            KeyCode::Left => form.cycle_option(taxonomy, field, -1),
            KeyCode::Right | KeyCode::Char(' ') => form.cycle_option(taxonomy, field, 1),
            KeyCode::Backspace | KeyCode::Delete => form.draft.select(field, None),
            _ => {}
        }
        return;
    }

    let Some(value) = form.draft.text_mut(field) else {
        return;
    };
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => value.clear(),
        (KeyModifiers::CONTROL, _) => {}
        (_, KeyCode::Backspace) => pop_grapheme(value),
        (_, KeyCode::Char(c)) => value.push(c),
        _ => {}
    }
}
