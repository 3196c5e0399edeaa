use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use url::Url;

/// Result of handling a key event in the location bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationResult {
  /// Key was handled, keep editing
  Consumed,
  /// Enter pressed with a usable location; carries the normalized path
  Go(String),
  /// Escape pressed, or Enter on an empty bar
  Cancelled,
  /// Key not handled, pass to next handler
  NotHandled,
}

/// Editable location bar, the page's address input
#[derive(Debug, Clone)]
pub struct LocationBar {
  buffer: String,
  /// Cursor position in chars
  cursor: usize,
  /// Only full URLs on this host are accepted
  web_host: String,
}

impl LocationBar {
  pub fn new(web_host: impl Into<String>) -> Self {
    Self {
      buffer: String::new(),
      cursor: 0,
      web_host: web_host.into(),
    }
  }

  /// Begin editing, pre-filled with the current location
  pub fn open(&mut self, current: &str) {
    self.buffer = current.to_string();
    self.cursor = self.buffer.chars().count();
  }

  pub fn value(&self) -> &str {
    &self.buffer
  }

  /// Get cursor position for rendering
  pub fn cursor_position(&self) -> usize {
    self.cursor
  }

  fn byte_index(&self, char_pos: usize) -> usize {
    self
      .buffer
      .char_indices()
      .nth(char_pos)
      .map(|(i, _)| i)
      .unwrap_or(self.buffer.len())
  }

  /// Handle a key event, returning the result
  pub fn handle_key(&mut self, key: KeyEvent) -> LocationResult {
    match key.code {
      KeyCode::Esc => LocationResult::Cancelled,
      KeyCode::Enter => match normalize_location(&self.buffer, &self.web_host) {
        Some(path) => LocationResult::Go(path),
        None => LocationResult::Cancelled,
      },
      KeyCode::Backspace => {
        if self.cursor > 0 {
          self.cursor -= 1;
          let at = self.byte_index(self.cursor);
          self.buffer.remove(at);
        }
        LocationResult::Consumed
      }
      KeyCode::Left => {
        self.cursor = self.cursor.saturating_sub(1);
        LocationResult::Consumed
      }
      KeyCode::Right => {
        self.cursor = (self.cursor + 1).min(self.buffer.chars().count());
        LocationResult::Consumed
      }
      KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        // Clear line before cursor
        let at = self.byte_index(self.cursor);
        self.buffer.drain(..at);
        self.cursor = 0;
        LocationResult::Consumed
      }
      KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
        let at = self.byte_index(self.cursor);
        self.buffer.insert(at, c);
        self.cursor += 1;
        LocationResult::Consumed
      }
      _ => LocationResult::NotHandled,
    }
  }
}

/// Turn location bar input into a page path on `web_host`.
///
/// Accepts full URLs (`https://github.com/owner/repo`), host-prefixed paths
/// (`github.com/owner/repo`), bare paths (`/owner/repo`) and paths without the
/// leading slash (`owner/repo`). URLs on any other host are rejected.
/// Query strings and fragments are dropped.
pub fn normalize_location(input: &str, web_host: &str) -> Option<String> {
  let input = input.trim();
  if input.is_empty() {
    return None;
  }

  if let Ok(url) = Url::parse(input) {
    if matches!(url.scheme(), "http" | "https") {
      let on_host = url
        .host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case(web_host));
      if !on_host {
        tracing::debug!("Rejecting location on foreign host: {}", input);
        return None;
      }
      return Some(url.path().to_string());
    }
  }

  let path = input.split(['?', '#']).next().unwrap_or_default();
  let path = match path.strip_prefix(web_host) {
    Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
    _ => path,
  };
  if path.starts_with('/') {
    Some(path.to_string())
  } else {
    Some(format!("/{}", path))
  }
}
