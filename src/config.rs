use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Base URL of the GitHub REST API
  pub base_url: String,
  /// User-Agent header sent with every request (GitHub rejects requests without one)
  pub user_agent: String,
  /// Dependency manifest path inside the repository
  pub manifest_path: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "https://api.github.com".to_string(),
      user_agent: concat!("superstats/", env!("CARGO_PKG_VERSION")).to_string(),
      manifest_path: "package.json".to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub enabled: bool,
  /// Seconds before a cached stats record is treated as stale
  pub ttl_secs: u64,
  /// Prefix for cache keys (`<namespace>_<owner>_<name>`)
  pub namespace: String,
  /// Database location (default: $XDG_DATA_HOME/superstats/cache.db)
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      ttl_secs: 3600,
      namespace: "github_superstats".to_string(),
      path: None,
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> Duration {
    Duration::from_secs(self.ttl_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
  /// How long an error toast stays on screen
  pub error_display_secs: u64,
  /// Location opened at startup when none is given on the command line
  pub start_path: Option<String>,
  /// Web host whose URLs the location bar accepts
  pub web_host: String,
}

impl Default for UiConfig {
  fn default() -> Self {
    Self {
      error_display_secs: 10,
      start_path: None,
      web_host: "github.com".to_string(),
    }
  }
}

impl UiConfig {
  pub fn error_display(&self) -> Duration {
    Duration::from_secs(self.error_display_secs)
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./superstats.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/superstats/config.yaml
  ///
  /// Without any file the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("superstats.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("superstats").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file deserializes to null; treat it as all defaults
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }
}
