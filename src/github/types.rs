use serde::{Deserialize, Serialize};
use std::fmt;

/// Owner/name pair naming a hosted repository.
///
/// Both parts are guaranteed non-empty; construct through [`RepoIdentifier::new`]
/// or [`RepoIdentifier::from_path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoIdentifier {
  owner: String,
  name: String,
}

impl RepoIdentifier {
  /// Build an identifier, returning None if either part is empty.
  pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Option<Self> {
    let owner = owner.into();
    let name = name.into();
    if owner.is_empty() || name.is_empty() {
      return None;
    }
    Some(Self { owner, name })
  }

  /// Derive an identifier from a location path.
  ///
  /// Segments 0 and 1 are the owner and repository name; anything after them
  /// (`/issues/3`, `/tree/main/src`) is ignored. Paths with fewer than two
  /// segments are not repository pages.
  pub fn from_path(path: &str) -> Option<Self> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let name = segments.next()?;
    Self::new(owner, name)
  }

  pub fn owner(&self) -> &str {
    &self.owner
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}

impl fmt::Display for RepoIdentifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.owner, self.name)
  }
}

/// Derived metrics for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoStats {
  pub stars: u64,
  pub forks: u64,
  pub open_issues: u64,
  pub default_branch: String,
  /// Estimated value in dollars, two decimals
  pub repo_value: String,
  /// Monthly maintenance estimate in hours, one decimal
  pub maintenance_hours: String,
  pub dependency_count: u64,
}

impl RepoStats {
  /// Assemble a stats record, deriving the value and maintenance estimates.
  pub fn new(
    stars: u64,
    forks: u64,
    open_issues: u64,
    default_branch: String,
    dependency_count: u64,
  ) -> Self {
    Self {
      stars,
      forks,
      open_issues,
      default_branch,
      repo_value: repo_value(stars, forks),
      maintenance_hours: maintenance_hours(open_issues),
      dependency_count,
    }
  }
}

/// `stars * forks * 0.10`, rendered with exactly two decimals.
///
/// Computed in whole cents so the result is exact for any input.
pub fn repo_value(stars: u64, forks: u64) -> String {
  let cents = u128::from(stars) * u128::from(forks) * 10;
  format!("{}.{:02}", cents / 100, cents % 100)
}

/// `open_issues * 0.3`, rendered with exactly one decimal.
pub fn maintenance_hours(open_issues: u64) -> String {
  let tenths = u128::from(open_issues) * 3;
  format!("{}.{}", tenths / 10, tenths % 10)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_identifier_from_deep_path() {
    let id = RepoIdentifier::from_path("/ownerX/repoY/issues/3").unwrap();
    assert_eq!(id.owner(), "ownerX");
    assert_eq!(id.name(), "repoY");
  }

  #[test]
  fn test_identifier_requires_two_segments() {
    assert_eq!(RepoIdentifier::from_path("/ownerX"), None);
    assert_eq!(RepoIdentifier::from_path("/"), None);
    assert_eq!(RepoIdentifier::from_path(""), None);
  }

  #[test]
  fn test_identifier_ignores_empty_segments() {
    let id = RepoIdentifier::from_path("//rust-lang//rust/").unwrap();
    assert_eq!(id.to_string(), "rust-lang/rust");
  }

  #[test]
  fn test_identifier_rejects_empty_parts() {
    assert!(RepoIdentifier::new("", "repo").is_none());
    assert!(RepoIdentifier::new("owner", "").is_none());
  }

  #[test]
  fn test_repo_value_two_decimals() {
    assert_eq!(repo_value(100, 50), "500.00");
    assert_eq!(repo_value(0, 50), "0.00");
    assert_eq!(repo_value(3, 7), "2.10");
    assert_eq!(repo_value(1, 1), "0.10");
  }

  #[test]
  fn test_maintenance_hours_one_decimal() {
    assert_eq!(maintenance_hours(7), "2.1");
    assert_eq!(maintenance_hours(0), "0.0");
    assert_eq!(maintenance_hours(10), "3.0");
  }

  #[test]
  fn test_stats_serialize_camel_case() {
    let stats = RepoStats::new(1, 2, 3, "main".to_string(), 4);
    let value = serde_json::to_value(&stats).unwrap();
    assert_eq!(value["openIssues"], 3);
    assert_eq!(value["repoValue"], "0.20");
    assert_eq!(value["maintenanceHours"], "0.9");
    assert_eq!(value["dependencyCount"], 4);
    assert_eq!(value["defaultBranch"], "main");
  }
}
