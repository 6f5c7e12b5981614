use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::tui::app::{App, ConfirmIntent};
use crate::util::text::display_width;

use super::centered_rect;

/// Render the y/n prompt for a pending [`ConfirmIntent`]
pub fn render_confirm_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(intent) = &app.confirm else {
        return;
    };
    let bg = app.theme.background;
    let prompt = intent.prompt();
    let accent = match intent {
        ConfirmIntent::DeleteProduct { .. } => app.theme.red,
        _ => app.theme.yellow,
    };

    let popup_w = (display_width(&prompt) as u16 + 4)
        .clamp(30, 60)
        .min(area.width);
    let inner_w = popup_w.saturating_sub(2).max(1) as usize;
    let prompt_lines = display_width(&prompt).div_ceil(inner_w).max(1) as u16;
    let popup = centered_rect(area, popup_w, prompt_lines + 4);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent).bg(bg))
        .style(Style::default().bg(bg));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let key_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let dim = Style::default().fg(app.theme.dim).bg(bg);
    let lines = vec![
        Line::from(Span::styled(
            prompt,
            Style::default().fg(app.theme.text_bright).bg(bg),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", key_style),
            Span::styled(" yes   ", dim),
            Span::styled("n", key_style),
            Span::styled(" no", dim),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(bg)),
        inner,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Resource;
    use crate::tui::app::tests::test_app;
    use crate::tui::render::test_helpers::render_to_string;

    #[test]
    fn delete_prompt() {
        let mut app = test_app();
        app.ask(ConfirmIntent::DeleteProduct {
            id: 2,
            name: "Laptop Air".into(),
        });
        let output = render_to_string(32, 5, |frame, area| {
            render_confirm_popup(frame, &app, area);
        });
        insta::assert_snapshot!(output, @r#"
        ┌──────────────────────────────┐
        │Delete product "Laptop Air"?  │
        │                              │
        │y yes   n no                  │
        └──────────────────────────────┘
        "#);
    }

    #[test]
    fn close_tab_prompt_names_the_tab() {
        let mut app = test_app();
        app.ask(ConfirmIntent::CloseTab {
            tab: Resource::Brands,
        });
        let output = render_to_string(70, 7, |frame, area| {
            render_confirm_popup(frame, &app, area);
        });
        assert!(output.contains("Close Brands and lose its search and filters?"));
    }
}
