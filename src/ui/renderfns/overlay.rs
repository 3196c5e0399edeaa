use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::github::{RepoIdentifier, RepoStats};

pub const OVERLAY_TITLE: &str = "GitHub SuperStats";

/// Label/value rows shown in the overlay, in display order
pub fn stat_items(stats: &RepoStats) -> Vec<(&'static str, String)> {
  vec![
    ("🚀 Estimated Value:", format!("${}", stats.repo_value)),
    (
      "⏳ Monthly Maintenance:",
      format!("{} hrs", stats.maintenance_hours),
    ),
    ("📦 Dependencies:", stats.dependency_count.to_string()),
    ("★ Stars:", stats.stars.to_string()),
    ("⑂ Forks:", stats.forks.to_string()),
    ("◎ Open issues:", stats.open_issues.to_string()),
    ("⎇ Branch:", stats.default_branch.clone()),
  ]
}

/// Draw the stats overlay panel
pub fn draw_overlay(frame: &mut Frame, area: Rect, id: &RepoIdentifier, stats: &RepoStats) {
  let block = Block::default()
    .title(format!(" {} ", OVERLAY_TITLE))
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Magenta));

  let mut lines = vec![
    Line::from(Span::styled(
      id.to_string(),
      Style::default().fg(Color::Yellow).bold(),
    )),
    Line::raw(""),
  ];

  lines.extend(stat_items(stats).into_iter().map(|(label, value)| {
    Line::from(vec![
      Span::styled(format!("{} ", label), Style::default().fg(Color::DarkGray)),
      Span::styled(value, Style::default().fg(Color::White).bold()),
    ])
  }));

  frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_stat_items_formatting() {
    let stats = RepoStats::new(100, 50, 7, "main".to_string(), 3);
    let items = stat_items(&stats);
    assert_eq!(items[0].1, "$500.00");
    assert_eq!(items[1].1, "2.1 hrs");
    assert_eq!(items[2].1, "3");
    assert_eq!(items[6].1, "main");
  }
}
