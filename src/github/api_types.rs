//! Serde-deserializable types matching GitHub API responses.
//!
//! These types are separate from domain types so missing or null fields can be
//! defaulted during deserialization while `RepoStats` stays strict.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Branch assumed when the repository response omits `default_branch`.
pub const FALLBACK_BRANCH: &str = "main";

// ============================================================================
// Repository endpoint response
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ApiRepository {
  #[serde(default)]
  pub stargazers_count: Option<u64>,
  #[serde(default)]
  pub forks_count: Option<u64>,
  /// Counts issues and pull requests together
  #[serde(default)]
  pub open_issues_count: Option<u64>,
  #[serde(default)]
  pub default_branch: Option<String>,
}

impl ApiRepository {
  pub fn stars(&self) -> u64 {
    self.stargazers_count.unwrap_or(0)
  }

  pub fn forks(&self) -> u64 {
    self.forks_count.unwrap_or(0)
  }

  pub fn open_issues(&self) -> u64 {
    self.open_issues_count.unwrap_or(0)
  }

  pub fn branch(&self) -> &str {
    self
      .default_branch
      .as_deref()
      .filter(|b| !b.is_empty())
      .unwrap_or(FALLBACK_BRANCH)
  }
}

// ============================================================================
// Dependency manifest (raw contents)
// ============================================================================

/// The parts of a `package.json` style manifest that declare dependencies.
///
/// Versions are kept as raw JSON so unusual specifiers never fail the parse.
#[derive(Debug, Default, Deserialize)]
pub struct ApiManifest {
  #[serde(default)]
  pub dependencies: Option<HashMap<String, serde_json::Value>>,
  #[serde(rename = "devDependencies", default)]
  pub dev_dependencies: Option<HashMap<String, serde_json::Value>>,
}

impl ApiManifest {
  /// Number of distinct package names across runtime and dev dependencies.
  pub fn dependency_count(&self) -> u64 {
    let names: HashSet<&str> = self
      .dependencies
      .iter()
      .chain(self.dev_dependencies.iter())
      .flat_map(|deps| deps.keys().map(String::as_str))
      .collect();
    names.len() as u64
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_repository_defaults() {
    let repo: ApiRepository = serde_json::from_str("{}").unwrap();
    assert_eq!(repo.stars(), 0);
    assert_eq!(repo.forks(), 0);
    assert_eq!(repo.open_issues(), 0);
    assert_eq!(repo.branch(), "main");
  }

  #[test]
  fn test_repository_null_branch_falls_back() {
    let repo: ApiRepository =
      serde_json::from_str(r#"{"stargazers_count": 5, "default_branch": null}"#).unwrap();
    assert_eq!(repo.stars(), 5);
    assert_eq!(repo.branch(), "main");
  }

  #[test]
  fn test_repository_ignores_unknown_fields() {
    let repo: ApiRepository = serde_json::from_str(
      r#"{"full_name": "a/b", "stargazers_count": 1, "forks_count": 2,
          "open_issues_count": 3, "default_branch": "trunk", "owner": {"login": "a"}}"#,
    )
    .unwrap();
    assert_eq!(repo.forks(), 2);
    assert_eq!(repo.open_issues(), 3);
    assert_eq!(repo.branch(), "trunk");
  }

  #[test]
  fn test_dependency_count_unions_keys() {
    let manifest: ApiManifest = serde_json::from_str(
      r#"{"dependencies": {"a": "1", "b": "2"}, "devDependencies": {"b": "2", "c": "3"}}"#,
    )
    .unwrap();
    assert_eq!(manifest.dependency_count(), 3);
  }

  #[test]
  fn test_dependency_count_without_maps() {
    let manifest: ApiManifest = serde_json::from_str(r#"{"name": "pkg"}"#).unwrap();
    assert_eq!(manifest.dependency_count(), 0);
  }

  #[test]
  fn test_dependency_count_dev_only() {
    let manifest: ApiManifest =
      serde_json::from_str(r#"{"devDependencies": {"jest": {"version": "29"}}}"#).unwrap();
    assert_eq!(manifest.dependency_count(), 1);
  }
}
