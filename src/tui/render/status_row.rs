use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::{Resource, SortDirection};
use crate::tui::app::{App, MessageKind, Mode};
use crate::util::text::{display_width, truncate_to_width};

/// Render the status row (bottom of screen): the transient message or a key
/// hint on the left, list state on the right
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let right = list_summary(app);
    let right_width = display_width(&right);
    let left_room = width.saturating_sub(right_width + 2);

    let left = match &app.message {
        Some(message) => {
            let color = match message.kind {
                MessageKind::Info => app.theme.green,
                MessageKind::Error => app.theme.red,
            };
            Span::styled(
                truncate_to_width(&format!(" {}", message.text), left_room),
                Style::default().fg(color).bg(bg),
            )
        }
        None => Span::styled(
            truncate_to_width(&format!(" {}", mode_hint(app)), left_room),
            Style::default().fg(app.theme.dim).bg(bg),
        ),
    };

    let padding = width.saturating_sub(display_width(&left.content) + right_width + 1);
    let right_color = match app.current_tab() {
        Some(tab) if tab.list.error().is_some() => app.theme.red,
        Some(tab) if tab.list.is_loading() => app.theme.yellow,
        _ => app.theme.text,
    };
    let line = Line::from(vec![
        left,
        Span::styled(" ".repeat(padding), Style::default().bg(bg)),
        Span::styled(right, Style::default().fg(right_color).bg(bg)),
    ]);

    frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), area);
}

fn mode_hint(app: &App) -> &'static str {
    match app.mode {
        Mode::Navigate if app.current_resource() == Some(Resource::Products) => {
            "/ search  f filter  n new  e edit  d delete  s sort  q quit"
        }
        Mode::Navigate => "/ search  s sort  [ ] page  1-5 tabs  q quit",
        Mode::Search => "type to search  ctrl-u clear  enter/esc done",
        Mode::Filter => "filters apply as you toggle",
        Mode::Form => "editing product",
        Mode::Confirm => "y confirm  n cancel",
    }
}

/// `name ↑  10/page  page 1/5 (47 total)`, or the fetch state
fn list_summary(app: &App) -> String {
    let Some(tab) = app.current_tab() else {
        return String::new();
    };
    if let Some(error) = tab.list.error() {
        return format!("error: {} ", error);
    }
    if tab.list.is_loading() && tab.list.items().is_empty() {
        return "loading\u{2026} ".to_string();
    }
    let filters = tab.list.filters();
    let sort = filters.sort();
    let arrow = match sort.direction {
        SortDirection::Asc => "\u{2191}",
        SortDirection::Desc => "\u{2193}",
    };
    let pagination = filters.pagination();
    let total = tab.list.total();
    format!(
        "{} {}  {}/page  page {}/{} ({} total) ",
        sort.field,
        arrow,
        pagination.page_size,
        pagination.page_index + 1,
        pagination.page_count(total),
        total
    )
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::tui::app::tests::test_app;
    use crate::tui::render::test_helpers::render_to_string;

    fn render(app: &App) -> String {
        render_to_string(100, 1, |frame, area| {
            render_status_row(frame, app, area);
        })
    }

    #[test]
    fn shows_hint_and_page_footer() {
        let app = test_app();
        let output = render(&app);
        assert!(output.starts_with(" / search  f filter"));
        assert!(output.ends_with("name \u{2191}  10/page  page 1/1 (3 total)"));
    }

    #[test]
    fn message_replaces_the_hint() {
        let mut app = test_app();
        app.set_message("Product created");
        let output = render(&app);
        assert!(output.starts_with(" Product created"));
        assert!(!output.contains("f filter"));
    }

    #[test]
    fn messages_expire() {
        let mut app = test_app();
        app.set_error("save failed");
        app.tick(Instant::now() + std::time::Duration::from_secs(5));
        assert!(app.message.is_none());
    }
}
