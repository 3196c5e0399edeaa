//! GitHub API access and repository stats derivation.

pub mod api_types;
pub mod client;
pub mod stats;
pub mod types;

pub use client::{GitHubClient, HostingApi};
pub use stats::RepoStatsFetcher;
pub use types::{RepoIdentifier, RepoStats};
