use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer: the error toast when one is showing, otherwise the page status
pub fn draw_footer(frame: &mut Frame, area: Rect, error: Option<&str>, status: &str) {
  let paragraph = match error {
    Some(message) => Paragraph::new(Line::from(vec![
      Span::styled(" ⚠ ", Style::default().fg(Color::Black).bg(Color::Red).bold()),
      Span::styled(format!(" {}", message), Style::default().fg(Color::Red)),
    ])),
    None => Paragraph::new(Line::from(Span::styled(
      format!(" {}", status),
      Style::default().fg(Color::DarkGray),
    ))),
  };

  frame.render_widget(paragraph.style(Style::default().bg(Color::Black)), area);
}
