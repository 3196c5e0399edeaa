use crate::config::Config;
use crate::event::{Event, EventHandler, OverlayEvent};
use crate::github::{GitHubClient, HostingApi, RepoIdentifier, RepoStats};
use crate::pipeline::{PipelineController, RenderSink};
use crate::ui;
use crate::ui::components::{LocationBar, LocationResult};
use crate::watcher::{NavigationWatcher, PageEvent, PageView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

pub type Controller = PipelineController<GitHubClient>;

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Location,
}

/// The stats panel currently mounted on the page
#[derive(Debug, Clone)]
pub struct Overlay {
  pub id: RepoIdentifier,
  pub stats: RepoStats,
}

/// An error message shown for a bounded time
#[derive(Debug, Clone)]
pub struct ErrorToast {
  pub message: String,
  shown_at: Instant,
}

impl ErrorToast {
  fn new(message: String) -> Self {
    Self {
      message,
      shown_at: Instant::now(),
    }
  }

  fn is_expired(&self, display_for: Duration, now: Instant) -> bool {
    now.saturating_duration_since(self.shown_at) >= display_for
  }
}

/// Render sink that hands pipeline output back to the event loop
struct ChannelSink {
  tx: mpsc::UnboundedSender<Event>,
}

impl RenderSink for ChannelSink {
  fn render(&self, id: &RepoIdentifier, stats: &RepoStats) {
    let _ = self.tx.send(Event::Overlay(OverlayEvent::Render(
      id.clone(),
      Box::new(stats.clone()),
    )));
  }

  fn render_error(&self, message: &str) {
    let _ = self
      .tx
      .send(Event::Overlay(OverlayEvent::Error(message.to_string())));
  }
}

/// Main application state; the terminal stands in for the browser page
pub struct App<A: HostingApi> {
  /// Visited locations, oldest first
  history: Vec<String>,
  /// Index of the current location in `history`
  history_pos: usize,

  /// Number of times the page body has been rebuilt
  page_renders: u64,

  overlay: Option<Overlay>,
  error: Option<ErrorToast>,

  /// Current input mode
  mode: Mode,
  location_bar: LocationBar,

  watcher: NavigationWatcher,
  controller: Arc<PipelineController<A>>,

  /// Application configuration
  config: Config,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  /// Whether to quit
  should_quit: bool,
}

impl<A: HostingApi + 'static> App<A> {
  pub fn new(config: Config, controller: PipelineController<A>) -> Self {
    let (tx, _rx) = mpsc::unbounded_channel();

    Self {
      history: Vec::new(),
      history_pos: 0,
      page_renders: 0,
      overlay: None,
      error: None,
      mode: Mode::Normal,
      location_bar: LocationBar::new(config.ui.web_host.clone()),
      watcher: NavigationWatcher::new(),
      controller: Arc::new(controller),
      config,
      event_tx: tx,
      should_quit: false,
    }
  }

  pub async fn run(&mut self, start_path: Option<String>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = events.sender();

    // Initial page load
    match start_path {
      Some(path) => self.navigate(path),
      None => self.mode = Mode::Location,
    }

    // Main loop
    let result = async {
      while !self.should_quit {
        terminal.draw(|frame| ui::draw(frame, self))?;

        if let Some(event) = events.next().await {
          self.handle_event(event);
        }
      }
      Ok::<_, color_eyre::Report>(())
    }
    .await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.expire_error_at(Instant::now()),
      Event::Page(page_event) => self.handle_page_event(page_event),
      Event::Overlay(overlay_event) => self.handle_overlay_event(overlay_event),
      Event::RunFinished(id) => self.watcher.finish(&id),
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Location => self.handle_location_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('q') => self.should_quit = true,
      KeyCode::Char('g') | KeyCode::Char(':') => {
        let current = self.current_path().unwrap_or("").to_string();
        self.location_bar.open(&current);
        self.mode = Mode::Location;
      }
      KeyCode::Left | KeyCode::Char('h') => self.go_back(),
      KeyCode::Right | KeyCode::Char('l') => self.go_forward(),
      KeyCode::Char('r') => self.rerender_page(),
      KeyCode::Esc => self.error = None,
      _ => {}
    }
  }

  fn handle_location_mode_key(&mut self, key: KeyEvent) {
    match self.location_bar.handle_key(key) {
      LocationResult::Go(path) => {
        self.mode = Mode::Normal;
        self.navigate(path);
      }
      LocationResult::Cancelled => self.mode = Mode::Normal,
      LocationResult::Consumed | LocationResult::NotHandled => {}
    }
  }

  /// Push a new location onto the history and load it
  fn navigate(&mut self, path: String) {
    self.history.truncate(self.history_pos + 1);
    self.history.push(path.clone());
    self.history_pos = self.history.len() - 1;
    self.load_location(path);
  }

  fn go_back(&mut self) {
    if self.history_pos > 0 {
      self.history_pos -= 1;
      self.load_location(self.history[self.history_pos].clone());
    }
  }

  fn go_forward(&mut self) {
    if self.history_pos + 1 < self.history.len() {
      self.history_pos += 1;
      self.load_location(self.history[self.history_pos].clone());
    }
  }

  /// Show `path`: the location changes and the body is rebuilt
  fn load_location(&mut self, path: String) {
    self.emit(Event::Page(PageEvent::Navigated(path)));
    self.rerender_page();
  }

  /// Rebuild the page body client-side, wiping the overlay
  fn rerender_page(&mut self) {
    self.page_renders += 1;
    self.overlay = None;
    self.emit(Event::Page(PageEvent::Mutated));
  }

  fn emit(&self, event: Event) {
    let _ = self.event_tx.send(event);
  }

  fn handle_page_event(&mut self, event: PageEvent) {
    let page = PageState {
      overlay_present: self.overlay.is_some(),
    };

    if let Some(id) = self.watcher.handle(&event, &page) {
      self.spawn_run(id);
    }
  }

  fn spawn_run(&self, id: RepoIdentifier) {
    let controller = Arc::clone(&self.controller);
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let run_id = id.clone();
      let sink = ChannelSink { tx: tx.clone() };
      let run = tokio::spawn(async move { controller.run(&run_id, &sink).await });

      // Completion is reported even if the run panicked
      match run.await {
        Ok(outcome) => tracing::debug!("Run for {} finished: {:?}", id, outcome),
        Err(e) => tracing::error!("Run for {} aborted: {}", id, e),
      }
      let _ = tx.send(Event::RunFinished(id));
    });
  }

  fn handle_overlay_event(&mut self, event: OverlayEvent) {
    match event {
      OverlayEvent::Render(id, stats) => {
        if self.current_repo().as_ref() != Some(&id) {
          tracing::debug!("Dropping stats for {}, page moved on", id);
          return;
        }
        self.overlay = Some(Overlay { id, stats: *stats });
      }
      OverlayEvent::Error(message) => {
        self.error = Some(ErrorToast::new(message));
      }
    }
  }

  /// Drop the error toast once it has been shown for the configured time.
  fn expire_error_at(&mut self, now: Instant) {
    let display_for = self.config.ui.error_display();
    if self
      .error
      .as_ref()
      .is_some_and(|toast| toast.is_expired(display_for, now))
    {
      self.error = None;
    }
  }

  // Accessors for UI rendering
  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn location_bar(&self) -> &LocationBar {
    &self.location_bar
  }

  pub fn current_path(&self) -> Option<&str> {
    self.history.get(self.history_pos).map(String::as_str)
  }

  pub fn current_repo(&self) -> Option<RepoIdentifier> {
    self.current_path().and_then(RepoIdentifier::from_path)
  }

  pub fn overlay(&self) -> Option<&Overlay> {
    self.overlay.as_ref()
  }

  pub fn error_message(&self) -> Option<&str> {
    self.error.as_ref().map(|toast| toast.message.as_str())
  }

  pub fn api_url(&self) -> &str {
    &self.config.api.base_url
  }

  pub fn web_host(&self) -> &str {
    &self.config.ui.web_host
  }

  pub fn page_renders(&self) -> u64 {
    self.page_renders
  }

  pub fn is_loading(&self) -> bool {
    self
      .current_repo()
      .is_some_and(|id| self.watcher.is_in_flight(&id))
  }

  pub fn history_position(&self) -> (usize, usize) {
    (self.history_pos + 1, self.history.len())
  }
}

/// Snapshot of the page the watcher consults
struct PageState {
  overlay_present: bool,
}

impl PageView for PageState {
  fn overlay_present(&self) -> bool {
    self.overlay_present
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{NoopStorage, StatsCache};
  use crate::github::client::ApiResponse;
  use crate::github::stats::tests::{response, FakeApi};
  use crate::github::RepoStatsFetcher;
  use crate::pipeline::tests::{controller, REPO};
  use async_trait::async_trait;
  use reqwest::StatusCode;
  use std::sync::atomic::{AtomicUsize, Ordering};

  /// Attach a fresh event channel to `app`.
  fn wire<A: HostingApi + 'static>(app: &mut App<A>) -> mpsc::UnboundedReceiver<Event> {
    let (tx, rx) = mpsc::unbounded_channel();
    app.event_tx = tx;
    rx
  }

  /// Feed events back into `app` until the loop goes quiet.
  async fn settle<A: HostingApi + 'static>(
    app: &mut App<A>,
    rx: &mut mpsc::UnboundedReceiver<Event>,
  ) {
    while let Ok(Some(event)) = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
      app.handle_event(event);
    }
  }

  fn app(api: FakeApi) -> (App<FakeApi>, mpsc::UnboundedReceiver<Event>) {
    let (controller, _) = controller(api);
    let mut app = App::new(Config::default(), controller);
    let rx = wire(&mut app);
    (app, rx)
  }

  fn id(owner: &str, name: &str) -> RepoIdentifier {
    RepoIdentifier::new(owner, name).unwrap()
  }

  #[tokio::test]
  async fn test_page_load_fetches_once_and_mounts_overlay() {
    let (mut app, mut rx) = app(FakeApi::ok(REPO, "{}"));

    // Navigated and Mutated both arrive for the same load
    app.navigate("/ownerX/repoY/issues".to_string());
    settle(&mut app, &mut rx).await;

    assert_eq!(app.controller.fetcher_api().calls(), 1);
    let overlay = app.overlay().unwrap();
    assert_eq!(overlay.id, id("ownerX", "repoY"));
    assert_eq!(overlay.stats.stars, 100);
    assert!(!app.is_loading());
    assert_eq!(app.page_renders(), 1);
  }

  #[tokio::test]
  async fn test_rerender_restores_overlay() {
    let (mut app, mut rx) = app(FakeApi::ok(REPO, "{}"));
    app.navigate("/a/b".to_string());
    settle(&mut app, &mut rx).await;

    // A re-render wipes the overlay and the watcher restores it
    app.rerender_page();
    settle(&mut app, &mut rx).await;

    assert!(app.overlay().is_some());
    assert_eq!(app.page_renders(), 2);
  }

  #[tokio::test]
  async fn test_stale_render_is_dropped() {
    let (mut app, mut rx) = app(FakeApi::ok(REPO, "{}"));

    // Move on before the first run reports back
    app.navigate("/a/b".to_string());
    app.navigate("/c/d".to_string());
    settle(&mut app, &mut rx).await;

    assert_eq!(app.controller.fetcher_api().calls(), 2);
    assert_eq!(app.overlay().unwrap().id, id("c", "d"));

    let stats = app.overlay().unwrap().stats.clone();
    app.handle_event(Event::Overlay(OverlayEvent::Render(
      id("a", "b"),
      Box::new(stats),
    )));
    assert_eq!(app.overlay().unwrap().id, id("c", "d"));
  }

  #[tokio::test]
  async fn test_error_toast_expires_after_display_time() {
    let api = FakeApi::new(
      response(StatusCode::INTERNAL_SERVER_ERROR, ""),
      response(StatusCode::OK, "{}"),
    );
    let (mut app, mut rx) = app(api);
    app.navigate("/a/b".to_string());
    settle(&mut app, &mut rx).await;

    assert!(app.overlay().is_none());
    assert_eq!(app.error_message(), Some("Failed to fetch repository data"));

    let shown_at = app.error.as_ref().unwrap().shown_at;
    app.expire_error_at(shown_at + Duration::from_secs(9));
    assert!(app.error_message().is_some());

    app.expire_error_at(shown_at + Duration::from_secs(10));
    assert_eq!(app.error_message(), None);
  }

  /// Hosting API whose repository lookup panics.
  struct PanickingApi {
    calls: Arc<AtomicUsize>,
  }

  #[async_trait]
  impl HostingApi for PanickingApi {
    async fn repository(&self, _id: &RepoIdentifier) -> Result<ApiResponse> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      panic!("repository lookup exploded");
    }

    async fn manifest(&self, _id: &RepoIdentifier, _path: &str, _branch: &str) -> Result<ApiResponse> {
      unreachable!()
    }
  }

  #[tokio::test]
  async fn test_panicking_run_still_finishes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let api = PanickingApi {
      calls: Arc::clone(&calls),
    };
    let cache = StatsCache::new(Arc::new(NoopStorage));
    let controller = PipelineController::new(cache, RepoStatsFetcher::new(api, "package.json"));
    let mut app = App::new(Config::default(), controller);
    let mut rx = wire(&mut app);

    app.navigate("/a/b".to_string());
    settle(&mut app, &mut rx).await;
    assert!(!app.watcher.is_in_flight(&id("a", "b")));
    assert!(!app.is_loading());

    // Not stuck: the next wipe starts a new run
    app.rerender_page();
    settle(&mut app, &mut rx).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }
}
