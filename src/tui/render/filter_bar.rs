use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::Resource;
use crate::ops::price::{PricePreset, format_bound};
use crate::tui::app::{App, Mode, Tab};

/// One line under the tabs: the search text and, on the products tab, a chip
/// per active filter value
pub fn render_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let Some(tab) = app.current_tab() else {
        return;
    };

    let mut spans: Vec<Span> = vec![Span::styled(" ", Style::default().bg(bg))];
    let search = tab.list.search_input();
    if !search.is_empty() || app.mode == Mode::Search {
        spans.push(Span::styled("/", Style::default().fg(app.theme.dim).bg(bg)));
        spans.push(Span::styled(
            search.to_string(),
            Style::default().fg(app.theme.text_bright).bg(bg),
        ));
        if app.mode == Mode::Search {
            spans.push(Span::styled(
                "\u{258C}",
                Style::default().fg(app.theme.highlight).bg(bg),
            ));
        }
        spans.push(Span::styled("  ", Style::default().bg(bg)));
    }

    let chips = chip_labels(app, tab);
    if chips.is_empty() && search.is_empty() && app.mode != Mode::Search {
        let hint = if tab.resource == Resource::Products {
            "no filters  (/ search, f filter)"
        } else {
            "no search  (/ search)"
        };
        spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
    }
    let chip_style = Style::default().fg(app.theme.text).bg(app.theme.chip_bg);
    for chip in chips {
        spans.push(Span::styled(format!(" {} ", chip), chip_style));
        spans.push(Span::styled(" ", Style::default().bg(bg)));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(bg)),
        area,
    );
}

/// `Brand: Acme`, `Price: $300 - $500`, ... in dimension order
pub fn chip_labels(app: &App, tab: &Tab) -> Vec<String> {
    let filters = tab.list.filters();
    let mut chips: Vec<String> = filters
        .chips()
        .into_iter()
        .map(|(dimension, id)| {
            format!("{}: {}", dimension.label(), app.taxonomy.label(dimension, id))
        })
        .collect();

    let selection = filters.selection();
    if selection.has_price_range() {
        let range = match PricePreset::active(selection) {
            Some(preset) => preset.label().to_string(),
            None => format!(
                "{} - {}",
                format_bound(selection.price_min),
                format_bound(selection.price_max)
            ),
        };
        chips.push(format!("Price: {}", range));
    }
    chips
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::model::Dimension;
    use crate::tui::app::tests::test_app;
    use crate::tui::render::test_helpers::render_to_string;

    #[test]
    fn chips_use_taxonomy_names() {
        let mut app = test_app();
        app.tabs[0].list.set_filter_values(Dimension::Supercategory, [1]);
        app.tabs[0].list.set_filter_values(Dimension::Category, [11]);
        app.tabs[0].list.set_filter_values(Dimension::Brand, [2]);
        app.tabs[0].list.set_price_range(Some(100.0), None);
        app.tick(Instant::now());

        let output = render_to_string(100, 1, |frame, area| {
            render_filter_bar(frame, &app, area);
        });
        assert_eq!(
            output,
            "  Brand: Globex   Supercategory: Electronics   Category: Laptops   Price: 100 - any"
        );
    }

    #[test]
    fn preset_chip_shows_preset_label() {
        let mut app = test_app();
        app.tabs[0]
            .list
            .toggle_price_preset(PricePreset::From300To500);
        let tab = &app.tabs[0];
        assert_eq!(chip_labels(&app, tab), vec!["Price: $300 - $500"]);
    }

    #[test]
    fn empty_bar_shows_hint() {
        let app = test_app();
        let output = render_to_string(60, 1, |frame, area| {
            render_filter_bar(frame, &app, area);
        });
        assert_eq!(output, " no filters  (/ search, f filter)");
    }
}
