use crate::config::ApiConfig;
use crate::github::types::RepoIdentifier;
use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use url::Url;

/// Header carrying the epoch second at which the rate-limit window resets.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Media type asking the contents endpoint for the raw file body.
const RAW_CONTENT_TYPE: &str = "application/vnd.github.v3.raw";

/// Status, rate-limit reset and body of a hosting API response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
  pub status: StatusCode,
  /// Value of `x-ratelimit-reset`, if present and numeric
  pub rate_limit_reset: Option<i64>,
  pub body: Vec<u8>,
}

impl ApiResponse {
  pub fn is_success(&self) -> bool {
    self.status.is_success()
  }
}

/// Read-only access to the hosting provider.
///
/// Implementations report any HTTP status as `Ok`; `Err` is reserved for
/// transport failures (DNS, TLS, connection reset, unreadable body).
#[async_trait]
pub trait HostingApi: Send + Sync {
  /// `GET /repos/{owner}/{name}`
  async fn repository(&self, id: &RepoIdentifier) -> Result<ApiResponse>;

  /// `GET /repos/{owner}/{name}/contents/{path}?ref={branch}` as raw content
  async fn manifest(&self, id: &RepoIdentifier, path: &str, branch: &str) -> Result<ApiResponse>;
}

/// GitHub REST API client
#[derive(Clone)]
pub struct GitHubClient {
  client: reqwest::Client,
  base_url: Url,
}

impl GitHubClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base_url = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid API base URL {}: {}", config.base_url, e))?;
    if base_url.cannot_be_a_base() {
      return Err(eyre!("API base URL cannot be a base: {}", config.base_url));
    }

    let mut headers = HeaderMap::new();
    headers.insert(
      USER_AGENT,
      config
        .user_agent
        .parse()
        .map_err(|e| eyre!("Invalid user agent {}: {}", config.user_agent, e))?,
    );

    let client = reqwest::Client::builder()
      .default_headers(headers)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client, base_url })
  }

  /// Build `{base}/repos/{owner}/{name}/{extra...}` with each segment percent-encoded.
  fn repo_url<'a>(&self, id: &RepoIdentifier, extra: impl IntoIterator<Item = &'a str>) -> Url {
    let mut url = self.base_url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
      segments
        .pop_if_empty()
        .extend(["repos", id.owner(), id.name()])
        .extend(extra);
    }
    url
  }

  async fn get(&self, url: Url, accept: Option<&str>) -> Result<ApiResponse> {
    tracing::debug!("GET {}", url);

    let mut request = self.client.get(url.clone());
    if let Some(accept) = accept {
      request = request.header(ACCEPT, accept);
    }

    let response = request
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", url, e))?;

    let status = response.status();
    let rate_limit_reset = response
      .headers()
      .get(RATE_LIMIT_RESET_HEADER)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.trim().parse::<i64>().ok());

    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read response from {}: {}", url, e))?
      .to_vec();

    Ok(ApiResponse {
      status,
      rate_limit_reset,
      body,
    })
  }
}

#[async_trait]
impl HostingApi for GitHubClient {
  async fn repository(&self, id: &RepoIdentifier) -> Result<ApiResponse> {
    let url = self.repo_url(id, []);
    self.get(url, None).await
  }

  async fn manifest(&self, id: &RepoIdentifier, path: &str, branch: &str) -> Result<ApiResponse> {
    let contents = std::iter::once("contents").chain(path.split('/').filter(|s| !s.is_empty()));
    let mut url = self.repo_url(id, contents);
    url.query_pairs_mut().append_pair("ref", branch);
    self.get(url, Some(RAW_CONTENT_TYPE)).await
  }
}
