use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, API host, and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, api_url: &str) {
  let domain = extract_domain(api_url);

  let mut spans = vec![
    Span::styled(" superstats ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", domain), Style::default().fg(Color::White)),
    Span::raw("  "),
  ];

  // Shortcuts - keys and brackets highlighted, descriptions dimmed
  for (key, label) in SHORTCUTS {
    spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
    spans.push(Span::styled(
      format!(" {}   ", label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

const SHORTCUTS: &[(&str, &str)] = &[
  ("<g>", "go to"),
  ("<h>", "back"),
  ("<l>", "forward"),
  ("<r>", "re-render"),
  ("<q>", "quit"),
];

/// Extract domain from API URL
fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}
