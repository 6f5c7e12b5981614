use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::Resource;
use crate::tui::app::{App, FilterPicker, Mode, PickerStage};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) | (_, KeyCode::Char('q')) => {
            app.request_quit()
        }

        // Tabs: 1-5 jump to (or open) a collection
        (_, KeyCode::Char(c @ '1'..='5')) => {
            let index = c as usize - '1' as usize;
            app.open_tab(Resource::ALL[index]);
        }
        (_, KeyCode::Tab) => app.next_tab(),
        (_, KeyCode::BackTab) => app.prev_tab(),
        (_, KeyCode::Char('x')) => app.request_close_tab(),

        // Rows
        (_, KeyCode::Char('j') | KeyCode::Down) => app.move_cursor(1),
        (_, KeyCode::Char('k') | KeyCode::Up) => app.move_cursor(-1),
        (_, KeyCode::Char('g') | KeyCode::Home) => {
            if let Some(tab) = app.current_tab_mut() {
                tab.cursor = 0;
            }
        }
        (_, KeyCode::Char('G') | KeyCode::End) => app.move_cursor(isize::MAX),

        // Pages
        (_, KeyCode::Char(']') | KeyCode::PageDown | KeyCode::Right) => {
            if let Some(tab) = app.current_tab_mut() {
                tab.list.next_page();
                tab.cursor = 0;
            }
        }
        (_, KeyCode::Char('[') | KeyCode::PageUp | KeyCode::Left) => {
            if let Some(tab) = app.current_tab_mut() {
                tab.list.prev_page();
                tab.cursor = 0;
            }
        }
        (_, KeyCode::Char('z')) => app.cycle_page_size(),

        // Search, sort, filters
        (_, KeyCode::Char('/')) => app.mode = Mode::Search,
        (_, KeyCode::Char('s')) => app.cycle_sort_field(),
        (_, KeyCode::Char('S')) => app.toggle_sort_direction(),
        (_, KeyCode::Char('c')) => {
            if let Some(tab) = app.current_tab_mut() {
                tab.list.clear_all();
                tab.cursor = 0;
            }
        }
        (_, KeyCode::Char('r')) => app.refresh_current(),

        // Products only
        (_, KeyCode::Char('f')) if on_products(app) => {
            app.picker = Some(FilterPicker {
                stage: PickerStage::Dimensions,
                cursor: 0,
            });
            app.mode = Mode::Filter;
        }
        (_, KeyCode::Char('n')) if on_products(app) => app.open_new_form(),
        (_, KeyCode::Char('e') | KeyCode::Enter) if on_products(app) => app.open_edit_form(),
        (_, KeyCode::Char('d')) if on_products(app) => app.request_delete(),

        _ => {}
    }
}

fn on_products(app: &App) -> bool {
    app.current_resource() == Some(Resource::Products)
}
