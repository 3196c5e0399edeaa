//! Cache-or-fetch pipeline feeding the overlay.

use crate::cache::StatsCache;
use crate::github::{HostingApi, RepoIdentifier, RepoStats, RepoStatsFetcher};

/// Paints the overlay or reports a failure to the user.
pub trait RenderSink: Send + Sync {
  /// Replace any existing overlay with `stats` for `id`.
  fn render(&self, id: &RepoIdentifier, stats: &RepoStats);

  /// Show `message` for a bounded time.
  fn render_error(&self, message: &str);
}

/// Which branch a pipeline run took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
  /// Not a repository page; nothing rendered
  Skipped,
  /// Rendered from a fresh cache entry
  Cached,
  /// Rendered from a network fetch, then cached
  Fetched,
  /// Fetch failed; error rendered
  Failed,
}

/// Orchestrates cache lookup, fetching and rendering.
///
/// Holds no per-run state; concurrent runs are independent.
pub struct PipelineController<A: HostingApi> {
  cache: StatsCache,
  fetcher: RepoStatsFetcher<A>,
}

impl<A: HostingApi> PipelineController<A> {
  pub fn new(cache: StatsCache, fetcher: RepoStatsFetcher<A>) -> Self {
    Self { cache, fetcher }
  }

  /// Run for the repository named by a location path.
  pub async fn run_path(&self, path: &str, sink: &dyn RenderSink) -> RunOutcome {
    match RepoIdentifier::from_path(path) {
      Some(id) => self.run(&id, sink).await,
      None => {
        tracing::debug!("{} is not a repository page", path);
        RunOutcome::Skipped
      }
    }
  }

  pub async fn run(&self, id: &RepoIdentifier, sink: &dyn RenderSink) -> RunOutcome {
    if let Some(stats) = self.cache.get(id) {
      sink.render(id, &stats);
      return RunOutcome::Cached;
    }

    match self.fetcher.fetch(id).await {
      Ok(stats) => {
        sink.render(id, &stats);
        self.cache.put(id, &stats);
        RunOutcome::Fetched
      }
      Err(e) => {
        tracing::error!("Stats for {} unavailable: {:?}", id, e);
        sink.render_error(&e.to_string());
        RunOutcome::Failed
      }
    }
  }
}
