pub mod components;
pub mod renderfns;

use crate::app::{App, Mode};
use crate::github::{HostingApi, RepoIdentifier};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Width of the overlay panel in columns
const OVERLAY_WIDTH: u16 = 40;

/// Main draw function
pub fn draw<A: HostingApi + 'static>(frame: &mut Frame, app: &App<A>) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Length(3), // Location bar
      Constraint::Min(1),    // Page body
      Constraint::Length(1), // Footer / error toast
    ])
    .split(frame.area());

  renderfns::draw_header(frame, chunks[0], app.api_url());
  draw_location_bar(frame, chunks[1], app);
  draw_page(frame, chunks[2], app);

  let (position, total) = app.history_position();
  let status = if app.is_loading() {
    format!("history {}/{}  fetching stats...", position, total)
  } else {
    format!("history {}/{}", position, total)
  };
  renderfns::draw_footer(frame, chunks[3], app.error_message(), &status);
}

fn draw_location_bar<A: HostingApi + 'static>(frame: &mut Frame, area: Rect, app: &App<A>) {
  let editing = *app.mode() == Mode::Location;

  let (text, border) = if editing {
    (app.location_bar().value(), Color::Yellow)
  } else {
    (app.current_path().unwrap_or(""), Color::DarkGray)
  };

  let block = Block::default()
    .title(format!(" {} ", app.web_host()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));
  let inner = block.inner(area);

  frame.render_widget(Paragraph::new(text).block(block), area);

  if editing {
    let cursor = u16::try_from(app.location_bar().cursor_position()).unwrap_or(u16::MAX);
    frame.set_cursor_position((inner.x.saturating_add(cursor), inner.y));
  }
}

fn draw_page<A: HostingApi + 'static>(frame: &mut Frame, area: Rect, app: &App<A>) {
  let page_area = match app.overlay() {
    Some(overlay) if area.width > OVERLAY_WIDTH * 2 => {
      let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(OVERLAY_WIDTH)])
        .split(area);
      renderfns::draw_overlay(frame, chunks[1], &overlay.id, &overlay.stats);
      chunks[0]
    }
    Some(overlay) => {
      // Narrow terminal: overlay takes the whole body
      renderfns::draw_overlay(frame, area, &overlay.id, &overlay.stats);
      return;
    }
    None => area,
  };

  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let lines = match app.current_path() {
    None => vec![Line::styled(
      "Press g to open a repository, e.g. /rust-lang/rust",
      Style::default().fg(Color::DarkGray),
    )],
    Some(path) => page_lines(path, app.page_renders()),
  };

  frame.render_widget(
    Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
    page_area,
  );
}

fn page_lines(path: &str, renders: u64) -> Vec<Line<'static>> {
  let heading = match RepoIdentifier::from_path(path) {
    Some(id) => Line::from(vec![
      Span::styled(id.owner().to_string(), Style::default().fg(Color::Cyan)),
      Span::raw(" / "),
      Span::styled(id.name().to_string(), Style::default().fg(Color::Cyan).bold()),
    ]),
    None => Line::styled(
      "Not a repository page",
      Style::default().fg(Color::DarkGray),
    ),
  };

  vec![
    heading,
    Line::raw(""),
    Line::styled(path.to_string(), Style::default().fg(Color::White)),
    Line::styled(
      format!("rendered {} time(s)", renders),
      Style::default().fg(Color::DarkGray),
    ),
  ]
}
