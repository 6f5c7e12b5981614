use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use serde_json::Value;

use crate::model::{Dimension, Resource};
use crate::ops::query::format_number;
use crate::ops::search::match_spans;
use crate::tui::app::{App, Tab};
use crate::util::text::{display_width, fit_left, fit_right};

const NAME_COL: usize = 1;
const MAX_COL_WIDTH: usize = 40;

struct Column {
    header: &'static str,
    numeric: bool,
}

const fn col(header: &'static str, numeric: bool) -> Column {
    Column { header, numeric }
}

fn columns(resource: Resource) -> &'static [Column] {
    const PRODUCTS: &[Column] = &[
        col("ID", true),
        col("NAME", false),
        col("SKU", false),
        col("PRICE", true),
        col("STOCK", true),
        col("BRAND", false),
        col("CATEGORY", false),
    ];
    const NAMED: &[Column] = &[col("ID", true), col("NAME", false)];
    const CATEGORIES: &[Column] = &[col("ID", true), col("NAME", false), col("SUPERCATEGORY", false)];
    const SUBCATEGORIES: &[Column] = &[col("ID", true), col("NAME", false), col("CATEGORY", false)];
    match resource {
        Resource::Products => PRODUCTS,
        Resource::Brands | Resource::Supercategories => NAMED,
        Resource::Categories => CATEGORIES,
        Resource::Subcategories => SUBCATEGORIES,
    }
}

fn str_field(item: &Value, field: &str) -> String {
    match item.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Name of the related entity, looked up by the item's foreign key
fn relation_label(app: &App, item: &Value, dimension: Dimension) -> String {
    match item.get(dimension.field()).and_then(Value::as_u64) {
        Some(id) => app.taxonomy.label(dimension, id),
        None => String::new(),
    }
}

fn row_cells(app: &App, resource: Resource, item: &Value) -> Vec<String> {
    let mut cells = vec![str_field(item, "id"), str_field(item, "name")];
    match resource {
        Resource::Products => {
            let price = item
                .get("price")
                .and_then(Value::as_f64)
                .map(|p| format!("${}", format_number(p)))
                .unwrap_or_default();
            cells.push(str_field(item, "sku"));
            cells.push(price);
            cells.push(str_field(item, "stock"));
            cells.push(relation_label(app, item, Dimension::Brand));
            cells.push(relation_label(app, item, Dimension::Category));
        }
        Resource::Categories => cells.push(relation_label(app, item, Dimension::Supercategory)),
        Resource::Subcategories => cells.push(relation_label(app, item, Dimension::Category)),
        Resource::Brands | Resource::Supercategories => {}
    }
    cells
}

/// Render the active tab's current page as an aligned table
pub fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let Some(tab) = app.current_tab() else {
        return;
    };

    if tab.list.items().is_empty() {
        let (text, color) = match tab.list.error() {
            Some(e) => (format!(" Could not load {}: {}", tab.resource.path(), e), app.theme.red),
            None if tab.list.is_loading() => (" Loading\u{2026}".to_string(), app.theme.dim),
            None => (empty_text(tab), app.theme.dim),
        };
        frame.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(color).bg(bg)))
                .style(Style::default().bg(bg)),
            area,
        );
        return;
    }

    let cols = columns(tab.resource);
    let rows: Vec<Vec<String>> = tab
        .list
        .items()
        .iter()
        .map(|item| row_cells(app, tab.resource, item))
        .collect();

    let mut widths: Vec<usize> = cols.iter().map(|c| display_width(c.header)).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(display_width(cell)).min(MAX_COL_WIDTH);
        }
    }

    let header_style = Style::default()
        .fg(app.theme.dim)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let header: Vec<String> = cols.iter().map(|c| c.header.to_string()).collect();
    let mut lines = vec![layout_row(app, &header, cols, &widths, header_style, None)];

    // Keep the cursor row in view
    let visible = (area.height as usize).saturating_sub(1).max(1);
    let offset = tab.cursor.saturating_sub(visible - 1);
    let term = tab.list.filters().selection().search_text.as_str();

    for (i, row) in rows.iter().enumerate().skip(offset).take(visible) {
        let style = if i == tab.cursor {
            Style::default()
                .fg(app.theme.text_bright)
                .bg(app.theme.selection_bg)
        } else {
            Style::default().fg(app.theme.text).bg(bg)
        };
        lines.push(layout_row(app, row, cols, &widths, style, Some(term)));
    }

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}

fn empty_text(tab: &Tab) -> String {
    if tab.list.filters().has_filters() {
        format!(" No {} match the current filters", tab.resource.path())
    } else {
        format!(" No {} yet", tab.resource.path())
    }
}

/// One table line. Matches of the applied search term in the name column are
/// highlighted.
fn layout_row<'a>(
    app: &App,
    cells: &[String],
    cols: &[Column],
    widths: &[usize],
    style: Style,
    term: Option<&str>,
) -> Line<'a> {
    let mut spans: Vec<Span<'a>> = Vec::new();
    for (i, (cell, col)) in cells.iter().zip(cols).enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", style));
        }
        let width = widths.get(i).copied().unwrap_or(0);
        let text = if col.numeric {
            fit_right(cell, width)
        } else {
            fit_left(cell, width)
        };
        match term {
            Some(term) if i == NAME_COL => push_highlighted(&mut spans, &text, term, style, app),
            _ => spans.push(Span::styled(text, style)),
        }
    }
    spans.push(Span::styled(" ", style));
    Line::from(spans)
}

fn push_highlighted<'a>(spans: &mut Vec<Span<'a>>, text: &str, term: &str, style: Style, app: &App) {
    let highlight = style.fg(app.theme.highlight).add_modifier(Modifier::BOLD);
    let mut last = 0;
    for range in match_spans(text, term) {
        if range.start > last {
            spans.push(Span::styled(text[last..range.start].to_string(), style));
        }
        spans.push(Span::styled(text[range.clone()].to_string(), highlight));
        last = range.end;
    }
    if last < text.len() {
        spans.push(Span::styled(text[last..].to_string(), style));
    }
}
