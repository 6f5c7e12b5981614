pub mod confirm_popup;
pub mod filter_bar;
pub mod filter_popup;
pub mod form_view;
pub mod recovery;
pub mod status_row;
pub mod tab_bar;
pub mod table;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::Block;

use super::app::App;

/// Main render function; dispatches to sub-renderers
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // A caught panic replaces the whole screen
    if let Some(message) = &app.recovery {
        recovery::render_recovery(frame, app, message, area);
        return;
    }

    // Layout: tab bar (2 rows) | filter bar | table | status row
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // tab bar + separator
            Constraint::Length(1), // search and filter chips
            Constraint::Min(1),    // table
            Constraint::Length(1), // status row
        ])
        .split(area);

    tab_bar::render_tab_bar(frame, app, chunks[0]);
    filter_bar::render_filter_bar(frame, app, chunks[1]);
    table::render_table(frame, app, chunks[2]);
    status_row::render_status_row(frame, app, chunks[3]);

    // Overlays, innermost last
    if app.picker.is_some() {
        filter_popup::render_filter_popup(frame, app, chunks[2]);
    }
    if app.form.is_some() {
        form_view::render_form(frame, app, area);
    }
    if app.confirm.is_some() {
        confirm_popup::render_confirm_popup(frame, app, area);
    }
}

/// A `w` x `h` rectangle centered in `area`, shrunk to fit
pub(super) fn centered_rect(area: Rect, w: u16, h: u16) -> Rect {
    let w = w.min(area.width);
    let h = h.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::app::tests::test_app;
    use crate::tui::app::ConfirmIntent;
    use test_helpers::{TERM_H, render_app};

    #[test]
    fn full_screen_layout() {
        let app = test_app();
        let output = render_app(&app);
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[0].starts_with(" 1 Products"));
        assert!(lines[1].ends_with("memory"));
        assert!(lines[2].contains("no filters"));
        assert!(lines[3].starts_with("ID  NAME"));
        assert!(lines[4].contains("Laptop Air"));
        assert!(lines[TERM_H as usize - 1].contains("page 1/1 (3 total)"));
    }

    #[test]
    fn recovery_screen_replaces_everything() {
        let mut app = test_app();
        app.recover("index out of bounds".into());
        let output = render_app(&app);
        assert!(output.contains("Something went wrong"));
        assert!(output.contains("index out of bounds"));
        assert!(!output.contains("Laptop Air"));
    }

    #[test]
    fn confirm_draws_over_the_form() {
        let mut app = test_app();
        app.open_new_form();
        app.form.as_mut().unwrap().draft.name = "x".into();
        app.ask(ConfirmIntent::DiscardForm);
        let output = render_app(&app);
        assert!(output.contains("Discard unsaved changes?"));
        assert!(output.contains("New product"));
    }

    #[test]
    fn centered_rect_fits_inside() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_rect(area, 10, 4), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_rect(area, 30, 40), area);
    }
}
