use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::tui::app::App;

/// Full-screen error page shown after a caught panic
pub fn render_recovery(frame: &mut Frame, app: &App, message: &str, area: Rect) {
    let bg = app.theme.background;
    let margin_x = 4u16.min(area.width / 8);
    let margin_y = 2u16.min(area.height / 8);
    let popup = Rect::new(
        area.x + margin_x,
        area.y + margin_y,
        area.width.saturating_sub(margin_x * 2),
        area.height.saturating_sub(margin_y * 2),
    );

    let block = Block::default()
        .title(Span::styled(
            " Something went wrong ",
            Style::default()
                .fg(app.theme.red)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.red).bg(bg))
        .style(Style::default().bg(bg));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let text = Style::default().fg(app.theme.text).bg(bg);
    let key = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(Span::styled(
            "The screen hit an unexpected error. Nothing was saved or lost on the server.",
            text,
        )),
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(app.theme.yellow).bg(bg),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("r", key),
            Span::styled(" reload   ", text),
            Span::styled("h", key),
            Span::styled(" back to products   ", text),
            Span::styled("q", key),
            Span::styled(" quit", text),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .style(Style::default().bg(bg)),
        inner,
    );
}
