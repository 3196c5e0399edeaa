mod app;
mod cache;
mod config;
mod event;
mod github;
mod pipeline;
mod ui;
mod watcher;

use cache::{KeyValueStore, NoopStorage, SqliteStorage, StatsCache};
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use github::{GitHubClient, RepoIdentifier, RepoStats, RepoStatsFetcher};
use pipeline::{PipelineController, RenderSink, RunOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "superstats")]
#[command(about = "Estimated value, maintenance and dependency stats for GitHub repositories")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/superstats/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Print stats for this location once and exit instead of starting the UI
  #[arg(short, long, value_name = "LOCATION")]
  print: Option<String>,

  /// Skip the persistent cache
  #[arg(long)]
  no_cache: bool,

  /// Location to open at startup, e.g. /rust-lang/rust or a github.com URL
  location: Option<String>,
}

/// Writes the overlay as plain text
struct StdoutSink;

impl RenderSink for StdoutSink {
  fn render(&self, id: &RepoIdentifier, stats: &RepoStats) {
    println!("{} · {}", ui::renderfns::overlay::OVERLAY_TITLE, id);
    for (label, value) in ui::renderfns::stat_items(stats) {
      println!("  {:<24} {}", label, value);
    }
  }

  fn render_error(&self, message: &str) {
    eprintln!("⚠️ {}", message);
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  let _log_guard = init_tracing()?;

  let controller = build_controller(&config, args.no_cache)?;

  if let Some(location) = args.print {
    let path = ui::components::normalize_location(&location, &config.ui.web_host)
      .ok_or_else(|| eyre!("Not a {} location: {:?}", config.ui.web_host, location))?;
    return match controller.run_path(&path, &StdoutSink).await {
      RunOutcome::Skipped => Err(eyre!("{} is not a repository page", path)),
      RunOutcome::Failed => Err(eyre!("Could not compute stats for {}", path)),
      RunOutcome::Cached | RunOutcome::Fetched => Ok(()),
    };
  }

  let start_path = args
    .location
    .or_else(|| config.ui.start_path.clone())
    .and_then(|l| ui::components::normalize_location(&l, &config.ui.web_host));

  // Initialize and run the app
  let mut app = app::App::new(config, controller);
  app.run(start_path).await?;

  Ok(())
}

fn build_controller(config: &config::Config, no_cache: bool) -> Result<app::Controller> {
  let storage: Arc<dyn KeyValueStore> = if no_cache || !config.cache.enabled {
    Arc::new(NoopStorage)
  } else {
    match &config.cache.path {
      Some(path) => Arc::new(SqliteStorage::open_at(path)?),
      None => Arc::new(SqliteStorage::open()?),
    }
  };

  let cache = StatsCache::new(storage)
    .with_ttl(config.cache.ttl())
    .with_namespace(config.cache.namespace.clone());

  let client = GitHubClient::new(&config.api)?;
  let fetcher = RepoStatsFetcher::new(client, config.api.manifest_path.clone());

  Ok(PipelineController::new(cache, fetcher))
}

/// Log to a file under the data directory; the terminal belongs to the UI.
///
/// Filter is read from SUPERSTATS_LOG (default: superstats=info).
fn init_tracing() -> Result<WorkerGuard> {
  let log_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("superstats");

  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let appender = tracing_appender::rolling::never(&log_dir, "superstats.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let env_filter = EnvFilter::try_from_env("SUPERSTATS_LOG")
    .unwrap_or_else(|_| EnvFilter::new("superstats=info"));

  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}
