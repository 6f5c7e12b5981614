use crossterm::event::{KeyCode, KeyEvent};

use crate::model::{Dimension, Resource};
use crate::ops::price::PricePreset;
use crate::tui::app::{App, FilterPicker, Mode, PICKER_ROWS, PickerStage, Tab};

/// The product filter picker: a list of dimensions, each opening a list of
/// values to toggle. Every toggle refetches immediately.
pub(super) fn handle_filter_picker(app: &mut App, key: KeyEvent) {
    let Some(picker) = app.picker.clone() else {
        app.mode = Mode::Navigate;
        return;
    };
    match picker.stage {
        PickerStage::Dimensions => handle_dimensions(app, picker, key),
        PickerStage::Values(dimension) => handle_values(app, picker, dimension, key),
        PickerStage::Price => handle_price(app, picker, key),
    }
}

fn close_picker(app: &mut App) {
    app.picker = None;
    app.mode = Mode::Navigate;
}

fn set_picker(app: &mut App, stage: PickerStage, cursor: usize) {
    app.picker = Some(FilterPicker { stage, cursor });
}

fn move_within(cursor: usize, delta: isize, rows: usize) -> usize {
    if rows == 0 {
        return 0;
    }
    cursor.saturating_add_signed(delta).min(rows - 1)
}

fn with_products(app: &mut App, f: impl FnOnce(&mut Tab)) {
    if let Some(index) = app.tab_index(Resource::Products) {
        let tab = &mut app.tabs[index];
        f(tab);
        tab.cursor = 0;
    }
}

fn handle_dimensions(app: &mut App, picker: FilterPicker, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('f') => close_picker(app),
        KeyCode::Char('j') | KeyCode::Down => {
            set_picker(app, picker.stage, move_within(picker.cursor, 1, PICKER_ROWS))
        }
        KeyCode::Char('k') | KeyCode::Up => {
            set_picker(app, picker.stage, move_within(picker.cursor, -1, PICKER_ROWS))
        }
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
            let stage = match Dimension::ALL.get(picker.cursor) {
                Some(dimension) => PickerStage::Values(*dimension),
                None => PickerStage::Price,
            };
            set_picker(app, stage, 0);
        }
        KeyCode::Char('c') => with_products(app, |tab| tab.list.clear_all()),
        _ => {}
    }
}

fn back_to_dimensions(app: &mut App, row: usize) {
    set_picker(app, PickerStage::Dimensions, row);
}

fn handle_values(app: &mut App, picker: FilterPicker, dimension: Dimension, key: KeyEvent) {
    let options = app.filter_options(dimension);
    match key.code {
        KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left | KeyCode::Backspace => {
            let row = Dimension::ALL
                .iter()
                .position(|d| *d == dimension)
                .unwrap_or(0);
            back_to_dimensions(app, row);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            set_picker(app, picker.stage, move_within(picker.cursor, 1, options.len()))
        }
        KeyCode::Char('k') | KeyCode::Up => {
            set_picker(app, picker.stage, move_within(picker.cursor, -1, options.len()))
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            if let Some((id, _)) = options.get(picker.cursor) {
                let id = *id;
                with_products(app, |tab| tab.list.toggle_filter_value(dimension, id));
            }
        }
        _ => {}
    }
}

fn handle_price(app: &mut App, picker: FilterPicker, key: KeyEvent) {
    let rows = PricePreset::ALL.len();
    match key.code {
        KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left | KeyCode::Backspace => {
            back_to_dimensions(app, Dimension::ALL.len());
        }
        KeyCode::Char('j') | KeyCode::Down => {
            set_picker(app, picker.stage, move_within(picker.cursor, 1, rows))
        }
        KeyCode::Char('k') | KeyCode::Up => {
            set_picker(app, picker.stage, move_within(picker.cursor, -1, rows))
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            if let Some(preset) = PricePreset::ALL.get(picker.cursor) {
                let preset = *preset;
                with_products(app, |tab| tab.list.toggle_price_preset(preset));
            }
        }
        _ => {}
    }
}
