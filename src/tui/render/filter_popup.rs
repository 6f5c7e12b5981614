use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::model::{Dimension, Resource};
use crate::ops::price::PricePreset;
use crate::tui::app::{App, FilterPicker, PickerStage};
use crate::util::text::fit_left;

use super::centered_rect;
use super::filter_bar::chip_labels;

const POPUP_W: u16 = 44;
const MAX_ROWS: usize = 12;

/// Render the filter picker over the product list
pub fn render_filter_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(picker) = &app.picker else {
        return;
    };
    let inner_w = POPUP_W.saturating_sub(4) as usize;

    let (title, rows, hint) = match picker.stage {
        PickerStage::Dimensions => (
            " Filters ".to_string(),
            dimension_rows(app, inner_w),
            "enter open  c clear  esc close",
        ),
        PickerStage::Values(dimension) => (
            format!(" {} ", dimension.label()),
            value_rows(app, dimension),
            "space toggle  esc back",
        ),
        PickerStage::Price => (" Price ".to_string(), price_rows(app), "space toggle  esc back"),
    };

    let bg = app.theme.background;
    let visible = rows.len().clamp(1, MAX_ROWS);
    let height = (visible + 4) as u16;
    let popup = centered_rect(area, POPUP_W, height);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(Span::styled(
            title,
            Style::default()
                .fg(app.theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .style(Style::default().bg(bg));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let lines = picker_lines(app, picker, rows, visible, inner_w, hint);
    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), inner);
}

fn picker_lines(
    app: &App,
    picker: &FilterPicker,
    rows: Vec<String>,
    visible: usize,
    inner_w: usize,
    hint: &str,
) -> Vec<Line<'static>> {
    let bg = app.theme.background;
    let mut lines = Vec::with_capacity(visible + 2);

    if rows.is_empty() {
        let text = match picker.stage {
            PickerStage::Values(Dimension::Category) => "Pick a supercategory first",
            PickerStage::Values(Dimension::Subcategory) => "Pick a category first",
            _ => "Nothing to choose from",
        };
        lines.push(Line::from(Span::styled(
            format!(" {}", text),
            Style::default().fg(app.theme.dim).bg(bg),
        )));
    }

    let offset = picker.cursor.saturating_sub(visible - 1);
    for (i, row) in rows.into_iter().enumerate().skip(offset).take(visible) {
        let selected = i == picker.cursor;
        let (marker, style) = if selected {
            (
                "\u{25B8}",
                Style::default()
                    .fg(app.theme.text_bright)
                    .bg(app.theme.selection_bg),
            )
        } else {
            (" ", Style::default().fg(app.theme.text).bg(bg))
        };
        lines.push(Line::from(Span::styled(
            format!("{} {}", marker, fit_left(&row, inner_w)),
            style,
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(" {}", hint),
        Style::default().fg(app.theme.dim).bg(bg),
    )));
    lines
}

/// `Brand          Acme, Globex` for each dimension, then the price row
fn dimension_rows(app: &App, inner_w: usize) -> Vec<String> {
    let Some(tab) = app
        .tab_index(Resource::Products)
        .map(|index| &app.tabs[index])
    else {
        return Vec::new();
    };
    let selection = tab.list.filters().selection();
    let label_w = 14;
    let value_w = inner_w.saturating_sub(label_w + 2);

    let mut rows: Vec<String> = Dimension::ALL
        .iter()
        .map(|dimension| {
            let values = selection.values(*dimension);
            let summary = if values.is_empty() {
                "any".to_string()
            } else {
                values
                    .iter()
                    .map(|id| app.taxonomy.label(*dimension, *id))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            format!(
                "{}{}",
                fit_left(dimension.label(), label_w),
                fit_left(&summary, value_w)
            )
        })
        .collect();

    let price = chip_labels(app, tab)
        .into_iter()
        .find_map(|chip| chip.strip_prefix("Price: ").map(str::to_string))
        .unwrap_or_else(|| "any".to_string());
    rows.push(format!("{}{}", fit_left("Price", label_w), fit_left(&price, value_w)));
    rows
}

fn value_rows(app: &App, dimension: Dimension) -> Vec<String> {
    let selected = app
        .tab_index(Resource::Products)
        .map(|index| app.tabs[index].list.filters().selection().values(dimension).clone())
        .unwrap_or_default();
    app.filter_options(dimension)
        .into_iter()
        .map(|(id, name)| {
            let mark = if selected.contains(&id) { "x" } else { " " };
            format!("[{}] {}", mark, name)
        })
        .collect()
}

fn price_rows(app: &App) -> Vec<String> {
    let active = app
        .tab_index(Resource::Products)
        .and_then(|index| PricePreset::active(app.tabs[index].list.filters().selection()));
    PricePreset::ALL
        .iter()
        .map(|preset| {
            let mark = if active == Some(*preset) { "\u{2022}" } else { " " };
            format!("({}) {}", mark, preset.label())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;

    use super::*;
    use crate::tui::app::tests::test_app;
    use crate::tui::input::tests::press;
    use crate::tui::render::test_helpers::render_to_string;

    fn render(app: &App) -> String {
        render_to_string(50, 14, |frame, area| {
            render_filter_popup(frame, app, area);
        })
    }

    #[test]
    fn dimension_stage_summarizes_selection() {
        let mut app = test_app();
        app.tabs[0].list.set_filter_values(Dimension::Brand, [1, 2]);
        press(&mut app, &[KeyCode::Char('f')]);
        let output = render(&app);
        assert!(output.contains("\u{25B8} Brand         Acme, Globex"));
        assert!(output.contains("  Category      any"));
        assert!(output.contains("Price         any"));
        assert!(output.contains(" Filters "));
    }

    #[test]
    fn value_stage_marks_selected_values() {
        let mut app = test_app();
        press(
            &mut app,
            &[KeyCode::Char('f'), KeyCode::Enter, KeyCode::Char(' ')],
        );
        let output = render(&app);
        assert!(output.contains("[x] Acme"));
        assert!(output.contains("[ ] Globex"));
    }

    #[test]
    fn subcategories_need_a_category() {
        let mut app = test_app();
        press(
            &mut app,
            &[
                KeyCode::Char('f'),
                KeyCode::Char('j'),
                KeyCode::Char('j'),
                KeyCode::Char('j'),
                KeyCode::Enter,
            ],
        );
        let output = render(&app);
        assert!(output.contains("Pick a category first"));
    }

    #[test]
    fn price_stage_marks_active_preset() {
        let mut app = test_app();
        app.tabs[0].list.toggle_price_preset(PricePreset::Over1000);
        app.picker = Some(FilterPicker {
            stage: PickerStage::Price,
            cursor: 0,
        });
        let output = render(&app);
        assert!(output.contains("(\u{2022}) More than $1000"));
        assert!(output.contains("( ) Less than $300"));
    }
}
