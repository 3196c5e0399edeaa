//! Turns a repository identifier into a [`RepoStats`] record.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use thiserror::Error;

use super::api_types::{ApiManifest, ApiRepository};
use super::client::HostingApi;
use super::types::{RepoIdentifier, RepoStats};

/// Failure of the repository metadata request.
///
/// Dependency scanning never produces one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  /// The API rejected the request with 403; wait for the window to reset
  #[error("GitHub API limit exceeded. Try again in {retry_after_minutes} minutes")]
  RateLimited { retry_after_minutes: i64 },
  /// Any other failure; the reason is logged but not shown to the user
  #[error("Failed to fetch repository data")]
  FetchFailed(String),
}

/// Minutes until the rate-limit window reset at `reset_epoch_secs`, rounded up.
pub fn retry_after_minutes(reset_epoch_secs: i64, now: DateTime<Utc>) -> i64 {
  let remaining_ms = reset_epoch_secs
    .saturating_mul(1000)
    .saturating_sub(now.timestamp_millis());
  (remaining_ms as f64 / 60_000.0).ceil() as i64
}

/// Fetches repository metadata and dependency manifest, deriving stats.
pub struct RepoStatsFetcher<A: HostingApi> {
  api: A,
  manifest_path: String,
}

impl<A: HostingApi> RepoStatsFetcher<A> {
  pub fn new(api: A, manifest_path: impl Into<String>) -> Self {
    Self {
      api,
      manifest_path: manifest_path.into(),
    }
  }

  #[cfg(test)]
  pub(crate) fn api(&self) -> &A {
    &self.api
  }

  /// Fetch metadata, then the manifest pinned to the resolved default branch.
  pub async fn fetch(&self, id: &RepoIdentifier) -> Result<RepoStats, FetchError> {
    let repo = self.fetch_metadata(id).await?;
    let branch = repo.branch().to_string();
    let dependency_count = self.count_dependencies(id, &branch).await;

    Ok(RepoStats::new(
      repo.stars(),
      repo.forks(),
      repo.open_issues(),
      branch,
      dependency_count,
    ))
  }

  async fn fetch_metadata(&self, id: &RepoIdentifier) -> Result<ApiRepository, FetchError> {
    let response = self
      .api
      .repository(id)
      .await
      .map_err(|e| FetchError::FetchFailed(e.to_string()))?;

    if response.status == StatusCode::FORBIDDEN {
      let retry_after_minutes = response
        .rate_limit_reset
        .map(|reset| retry_after_minutes(reset, Utc::now()))
        .unwrap_or(0);
      return Err(FetchError::RateLimited {
        retry_after_minutes,
      });
    }

    if !response.is_success() {
      return Err(FetchError::FetchFailed(format!(
        "{} returned {}",
        id, response.status
      )));
    }

    serde_json::from_slice(&response.body)
      .map_err(|e| FetchError::FetchFailed(format!("Failed to parse repository {}: {}", id, e)))
  }

  /// Count distinct dependencies declared in the manifest on `branch`.
  ///
  /// Every failure (missing file, transport error, malformed JSON) counts as zero.
  async fn count_dependencies(&self, id: &RepoIdentifier, branch: &str) -> u64 {
    let response = match self.api.manifest(id, &self.manifest_path, branch).await {
      Ok(response) => response,
      Err(e) => {
        tracing::debug!("Manifest request for {} failed: {}", id, e);
        return 0;
      }
    };

    if !response.is_success() {
      tracing::debug!(
        "No {} for {} on {} ({})",
        self.manifest_path,
        id,
        branch,
        response.status
      );
      return 0;
    }

    match serde_json::from_slice::<ApiManifest>(&response.body) {
      Ok(manifest) => manifest.dependency_count(),
      Err(e) => {
        tracing::debug!("Unparsable {} for {}: {}", self.manifest_path, id, e);
        0
      }
    }
  }
}
