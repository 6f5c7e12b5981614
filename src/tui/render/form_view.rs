use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::ops::validate::FormField;
use crate::tui::app::{App, ProductForm, form_dimension};
use crate::util::text::{display_width, fit_left, truncate_to_width};

use super::centered_rect;

const LABEL_W: usize = 15;

/// Render the create/edit product form
pub fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let Some(form) = &app.form else {
        return;
    };
    let bg = app.theme.background;
    let popup_w = 64.min(area.width.saturating_sub(2));
    let value_w = (popup_w as usize).saturating_sub(LABEL_W + 6);

    let mut lines: Vec<Line> = Vec::new();
    for (i, field) in FormField::ALL.iter().enumerate() {
        lines.push(field_line(app, form, *field, i == form.focus, value_w));
        if let Some(message) = form.error_for(*field) {
            lines.push(Line::from(Span::styled(
                format!("{}  {}", " ".repeat(LABEL_W), message),
                Style::default().fg(app.theme.red).bg(bg),
            )));
        }
    }

    lines.push(Line::from(""));
    let submit_label = if form.editing.is_some() { "[ Save ]" } else { "[ Create ]" };
    let submit_style = if form.on_submit_row() {
        Style::default()
            .fg(app.theme.text_bright)
            .bg(app.theme.selection_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.text).bg(bg)
    };
    lines.push(Line::from(vec![
        Span::styled(" ".repeat(LABEL_W + 2), Style::default().bg(bg)),
        Span::styled(submit_label, submit_style),
    ]));
    lines.push(Line::from(Span::styled(
        " tab next  \u{2190}\u{2192} choose  ctrl-s save  esc close",
        Style::default().fg(app.theme.dim).bg(bg),
    )));

    let height = (lines.len() as u16 + 2).min(area.height);
    let popup = centered_rect(area, popup_w, height);
    frame.render_widget(Clear, popup);

    let title = if form.is_dirty() {
        format!(" {} * ", form.title())
    } else {
        format!(" {} ", form.title())
    };
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
    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), inner);
}

fn field_line(
    app: &App,
    form: &ProductForm,
    field: FormField,
    focused: bool,
    value_w: usize,
) -> Line<'static> {
    let bg = app.theme.background;
    let label_style = if focused {
        Style::default()
            .fg(app.theme.highlight)
            .bg(bg)
            .add_modifier(Modifier::BOLD)
    } else if form.error_for(field).is_some() {
        Style::default().fg(app.theme.red).bg(bg)
    } else {
        Style::default().fg(app.theme.dim).bg(bg)
    };
    let value_style = Style::default().fg(app.theme.text_bright).bg(bg);
    let marker = if focused { "\u{25B8}" } else { " " };

    let mut spans = vec![
        Span::styled(format!("{} ", marker), label_style),
        Span::styled(fit_left(field.label(), LABEL_W), label_style),
    ];

    match (form_dimension(field), form.draft.text(field)) {
        (Some(dimension), _) => {
            let choice = form
                .draft
                .selected(field)
                .map(|id| app.taxonomy.label(dimension, id));
            let (text, style) = match choice {
                Some(name) => (name, value_style),
                None if form.options(&app.taxonomy, field).is_empty() => (
                    "(choose the parent first)".to_string(),
                    Style::default().fg(app.theme.dim).bg(bg),
                ),
                None => (
                    "(none)".to_string(),
                    Style::default().fg(app.theme.dim).bg(bg),
                ),
            };
            if focused {
                spans.push(Span::styled("\u{2039} ", label_style));
                spans.push(Span::styled(truncate_to_width(&text, value_w.saturating_sub(4)), style));
                spans.push(Span::styled(" \u{203A}", label_style));
            } else {
                spans.push(Span::styled(truncate_to_width(&text, value_w), style));
            }
        }
        (None, Some(value)) => {
            // Show the tail of long values so the cursor stays visible
            let shown = tail_to_width(value, value_w.saturating_sub(1));
            spans.push(Span::styled(shown, value_style));
            if focused {
                spans.push(Span::styled(
                    "\u{258C}",
                    Style::default().fg(app.theme.highlight).bg(bg),
                ));
            }
        }
        (None, None) => {}
    }
    Line::from(spans)
}

/// The longest suffix of `s` that fits in `cells` columns
fn tail_to_width(s: &str, cells: usize) -> String {
    let flat = s.replace('\n', " ");
    let mut start = 0;
    while display_width(&flat[start..]) > cells {
        match flat[start..].chars().next() {
            Some(c) => start += c.len_utf8(),
            None => break,
        }
    }
    flat[start..].to_string()
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;

    use super::*;
    use crate::tui::app::tests::test_app;
    use crate::tui::input::tests::{press, type_str};
    use crate::tui::render::test_helpers::render_to_string;

    fn render(app: &App) -> String {
        render_to_string(70, 30, |frame, area| {
            render_form(frame, app, area);
        })
    }

    #[test]
    fn new_form_shows_every_field() {
        let mut app = test_app();
        press(&mut app, &[KeyCode::Char('n')]);
        type_str(&mut app, "Desk");
        let output = render(&app);
        assert!(output.contains(" New product * "));
        assert!(output.contains("\u{25B8} Name           Desk\u{258C}"));
        assert!(output.contains("Image URL"));
        assert!(output.contains("Supercategory  (none)"));
        assert!(output.contains("Category       (choose the parent first)"));
        assert!(output.contains("[ Create ]"));
    }

    #[test]
    fn edit_form_prefills_names() {
        let mut app = test_app();
        press(&mut app, &[KeyCode::Char('e')]);
        let output = render(&app);
        assert!(output.contains(" Edit product #2 "));
        assert!(output.contains("Brand          Globex"));
        assert!(output.contains("Subcategory    Ultrabooks"));
        assert!(output.contains("[ Save ]"));
    }

    #[test]
    fn errors_render_under_their_field() {
        let mut app = test_app();
        press(&mut app, &[KeyCode::Char('n'), KeyCode::BackTab, KeyCode::Enter]);
        let output = render(&app);
        let lines: Vec<&str> = output.lines().collect();
        let name = lines.iter().position(|l| l.contains(" Name ")).unwrap();
        assert!(lines[name + 1].contains("Name is required"));
        assert!(output.contains("Price is required"));
    }

    #[test]
    fn tail_keeps_the_end_visible() {
        assert_eq!(tail_to_width("abcdef", 3), "def");
        assert_eq!(tail_to_width("ab", 3), "ab");
        assert_eq!(tail_to_width("a\nb", 5), "a b");
    }
}
