use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::Resource;
use crate::tui::app::App;
use crate::util::text::{display_width, truncate_to_width};

/// Render the tab bar: open collection tabs, with a separator line below
/// carrying the data source
pub fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // tabs
            Constraint::Length(1), // separator
        ])
        .split(area);

    let sep_cols = render_tabs(frame, app, chunks[0]);
    render_separator(frame, app, chunks[1], &sep_cols);
}

/// Render tabs and return the column of each separator character
fn render_tabs(frame: &mut Frame, app: &App, area: Rect) -> Vec<usize> {
    let bg = app.theme.background;
    let mut spans: Vec<Span> = Vec::new();
    let mut sep_cols = Vec::new();
    let sep = Span::styled("\u{2502}", Style::default().fg(app.theme.dim).bg(bg));

    for (i, tab) in app.tabs.iter().enumerate() {
        let is_current = i == app.active;
        let style = tab_style(app, is_current);
        let key = Resource::ALL
            .iter()
            .position(|r| *r == tab.resource)
            .map_or(0, |p| p + 1);
        spans.push(Span::styled(
            format!(" {} {}", key, tab.resource.label()),
            style,
        ));
        if app.dirty.is_dirty(tab.surface()) {
            spans.push(Span::styled(
                "*",
                Style::default()
                    .fg(app.theme.yellow)
                    .bg(if is_current { app.theme.selection_bg } else { bg }),
            ));
        }
        if tab.list.is_loading() {
            spans.push(Span::styled("\u{2026}", style));
        }
        spans.push(Span::styled(" ", style));
        sep_cols.push(spans.iter().map(|s| display_width(&s.content)).sum());
        spans.push(sep.clone());
    }

    let tabs = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(tabs, area);
    sep_cols
}

fn render_separator(frame: &mut Frame, app: &App, area: Rect, sep_cols: &[usize]) {
    let width = area.width as usize;
    let bg = app.theme.background;
    let dim = Style::default().fg(app.theme.dim).bg(bg);

    // Source label at the right edge, with a space either side
    let label = truncate_to_width(&app.source_label, width / 2);
    let label_width = display_width(&label);
    let line_end = width.saturating_sub(label_width + 2);

    let mut rule = String::with_capacity(line_end * 3);
    for col in 0..line_end {
        rule.push(if sep_cols.contains(&col) {
            '\u{2534}'
        } else {
            '\u{2500}'
        });
    }
    let mut spans = vec![Span::styled(rule, dim)];
    if !label.is_empty() && line_end > 0 {
        spans.push(Span::styled(" ", dim));
        spans.push(Span::styled(label, dim));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)).style(dim), area);
}

/// Style for a tab: highlighted if current, normal otherwise
fn tab_style(app: &App, is_current: bool) -> Style {
    if is_current {
        Style::default()
            .fg(app.theme.text_bright)
            .bg(app.theme.selection_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.dim).bg(app.theme.background)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::tui::app::tests::test_app;
    use crate::tui::render::test_helpers::render_to_string;

    #[test]
    fn tabs_show_keys_and_source() {
        let mut app = test_app();
        app.open_tab(Resource::Brands);
        app.tick(Instant::now());
        let output = render_to_string(50, 2, |frame, area| {
            render_tab_bar(frame, &app, area);
        });
        insta::assert_snapshot!(output, @r"
         1 Products │ 2 Brands │
        ────────────┴──────────┴────────────────── memory
        ");
    }

    #[test]
    fn dirty_tab_is_marked() {
        let mut app = test_app();
        app.tabs[0].list.set_search_text("lap", Instant::now());
        app.sync_dirty();
        app.tick(Instant::now());
        let output = render_to_string(50, 1, |frame, area| {
            render_tab_bar(frame, &app, area);
        });
        assert!(output.starts_with(" 1 Products* │"));
    }
}
