//! Decides when the page needs a pipeline run.
//!
//! Two triggers feed the watcher: location changes (initial load, location bar,
//! history) and page mutations (a client-side re-render that may have wiped the
//! overlay). Both converge on a single "run for this identifier" decision.

use std::collections::HashSet;
use std::time::Instant;

use crate::github::RepoIdentifier;

/// Something happened to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
  /// The location changed to this path
  Navigated(String),
  /// The page body was structurally modified
  Mutated,
}

/// What the watcher may ask of the page.
pub trait PageView {
  /// Whether the stats overlay is currently mounted.
  fn overlay_present(&self) -> bool;
}

/// Marks that mutation events are being observed.
#[derive(Debug)]
pub struct ObserverHandle {
  installed_at: Instant,
}

/// Per-page-lifetime watcher state.
#[derive(Debug, Default)]
pub struct NavigationWatcher {
  /// Path of the last location that triggered a run
  last_processed_path: Option<String>,
  /// Present once the first repository page has been seen
  observer: Option<ObserverHandle>,
  /// Path the page currently shows
  current_path: String,
  /// Identifiers with a run in flight
  in_flight: HashSet<RepoIdentifier>,
}

impl NavigationWatcher {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start observing mutations. Returns false if already observing.
  pub fn install_observer(&mut self) -> bool {
    if self.observer.is_some() {
      return false;
    }
    tracing::debug!("Observing page mutations");
    self.observer = Some(ObserverHandle {
      installed_at: Instant::now(),
    });
    true
  }

  #[cfg(test)]
  fn observer(&self) -> Option<&ObserverHandle> {
    self.observer.as_ref()
  }

  #[cfg(test)]
  fn current_path(&self) -> &str {
    &self.current_path
  }

  /// Handle a page event, returning the identifier to run the pipeline for.
  ///
  /// The caller must report completion of every returned run via [`finish`].
  ///
  /// [`finish`]: NavigationWatcher::finish
  pub fn handle(&mut self, event: &PageEvent, page: &impl PageView) -> Option<RepoIdentifier> {
    match event {
      PageEvent::Navigated(path) => self.on_navigated(path),
      PageEvent::Mutated => self.on_mutated(page),
    }
  }

  fn on_navigated(&mut self, path: &str) -> Option<RepoIdentifier> {
    self.current_path = path.to_string();

    let id = RepoIdentifier::from_path(path)?;

    let trigger = if self.last_processed_path.as_deref() != Some(path) {
      self.last_processed_path = Some(path.to_string());
      self.begin(id)
    } else {
      None
    };

    self.install_observer();
    trigger
  }

  fn on_mutated(&mut self, page: &impl PageView) -> Option<RepoIdentifier> {
    let Some(observer) = &self.observer else {
      return None;
    };
    if page.overlay_present() {
      return None;
    }
    tracing::trace!(
      "Mutation {:?} after observer install",
      observer.installed_at.elapsed()
    );
    let id = RepoIdentifier::from_path(&self.current_path)?;
    self.begin(id)
  }

  fn begin(&mut self, id: RepoIdentifier) -> Option<RepoIdentifier> {
    if !self.in_flight.insert(id.clone()) {
      tracing::debug!("Run for {} already in flight", id);
      return None;
    }
    tracing::debug!("Triggering run for {}", id);
    Some(id)
  }

  /// Mark the run for `id` as complete.
  pub fn finish(&mut self, id: &RepoIdentifier) {
    self.in_flight.remove(id);
  }

  pub fn is_in_flight(&self, id: &RepoIdentifier) -> bool {
    self.in_flight.contains(id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Page {
    overlay: bool,
  }

  impl PageView for Page {
    fn overlay_present(&self) -> bool {
      self.overlay
    }
  }

  const EMPTY: Page = Page { overlay: false };
  const MOUNTED: Page = Page { overlay: true };

  fn nav(path: &str) -> PageEvent {
    PageEvent::Navigated(path.to_string())
  }

  fn id(owner: &str, name: &str) -> RepoIdentifier {
    RepoIdentifier::new(owner, name).unwrap()
  }

  #[test]
  fn test_navigation_triggers_run() {
    let mut watcher = NavigationWatcher::new();
    assert_eq!(
      watcher.handle(&nav("/ownerX/repoY/issues/3"), &EMPTY),
      Some(id("ownerX", "repoY"))
    );
    assert!(watcher.observer().is_some());
  }

  #[test]
  fn test_same_path_does_not_retrigger() {
    let mut watcher = NavigationWatcher::new();
    let first = watcher.handle(&nav("/a/b"), &EMPTY).unwrap();
    watcher.finish(&first);

    assert_eq!(watcher.handle(&nav("/a/b"), &EMPTY), None);
  }

  #[test]
  fn test_non_repository_page_is_ignored() {
    let mut watcher = NavigationWatcher::new();
    assert_eq!(watcher.handle(&nav("/ownerX"), &EMPTY), None);
    assert!(watcher.observer().is_none());
    assert_eq!(watcher.current_path(), "/ownerX");
  }

  #[test]
  fn test_mutation_ignored_before_observer() {
    let mut watcher = NavigationWatcher::new();
    watcher.handle(&nav("/"), &EMPTY);
    assert_eq!(watcher.handle(&PageEvent::Mutated, &EMPTY), None);
  }

  #[test]
  fn test_mutation_with_overlay_present_is_noop() {
    let mut watcher = NavigationWatcher::new();
    let first = watcher.handle(&nav("/a/b"), &EMPTY).unwrap();
    watcher.finish(&first);

    for _ in 0..5 {
      assert_eq!(watcher.handle(&PageEvent::Mutated, &MOUNTED), None);
    }
  }

  #[test]
  fn test_mutation_after_overlay_wiped_triggers_run() {
    let mut watcher = NavigationWatcher::new();
    let first = watcher.handle(&nav("/a/b"), &EMPTY).unwrap();
    watcher.finish(&first);

    assert_eq!(
      watcher.handle(&PageEvent::Mutated, &EMPTY),
      Some(id("a", "b"))
    );
  }

  #[test]
  fn test_in_flight_run_is_not_duplicated() {
    let mut watcher = NavigationWatcher::new();
    let first = watcher.handle(&nav("/a/b"), &EMPTY).unwrap();
    assert!(watcher.is_in_flight(&first));

    // Overlay not painted yet; mutation must not start a second fetch
    assert_eq!(watcher.handle(&PageEvent::Mutated, &EMPTY), None);
    // Same repository via a different path
    assert_eq!(watcher.handle(&nav("/a/b/pulls"), &EMPTY), None);

    watcher.finish(&first);
    assert!(!watcher.is_in_flight(&first));
    assert_eq!(
      watcher.handle(&PageEvent::Mutated, &EMPTY),
      Some(id("a", "b"))
    );
  }

  #[test]
  fn test_different_repositories_run_concurrently() {
    let mut watcher = NavigationWatcher::new();
    assert!(watcher.handle(&nav("/a/b"), &EMPTY).is_some());
    assert_eq!(watcher.handle(&nav("/c/d"), &EMPTY), Some(id("c", "d")));
  }

  #[test]
  fn test_returning_after_non_repository_page() {
    let mut watcher = NavigationWatcher::new();
    let first = watcher.handle(&nav("/a/b"), &EMPTY).unwrap();
    watcher.finish(&first);

    watcher.handle(&nav("/settings"), &EMPTY);
    assert_eq!(watcher.handle(&PageEvent::Mutated, &EMPTY), None);

    // Location matches the last processed path; the re-render brings the overlay back
    assert_eq!(watcher.handle(&nav("/a/b"), &EMPTY), None);
    assert_eq!(
      watcher.handle(&PageEvent::Mutated, &EMPTY),
      Some(id("a", "b"))
    );
  }

  #[test]
  fn test_observer_installed_once() {
    let mut watcher = NavigationWatcher::new();
    assert!(watcher.install_observer());
    let installed_at = watcher.observer().unwrap().installed_at;
    assert!(!watcher.install_observer());
    assert_eq!(watcher.observer().unwrap().installed_at, installed_at);
  }
}
