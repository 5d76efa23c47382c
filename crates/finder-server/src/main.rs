//! finder-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, spawns the enrichment queue consumer, and serves
//! the JSON API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use finder_api::ApiState;
use finder_ingest::{JobQueue, QueueConfig, QueueConsumer, YoutubeSource};
use finder_store_sqlite::SqliteStore;
use finder_youtube::{YoutubeClient, YoutubeConfig};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` with a
/// `FINDER_`-prefixed environment overlay. Only `api_key` and `origin` have
/// no defaults.
#[derive(Deserialize, Clone)]
struct ServerConfig {
  /// YouTube Data API key.
  api_key: String,
  /// Value sent as the `Referer` header on every API call; must match the
  /// key's referrer restriction.
  origin: String,

  #[serde(default = "default_host")]
  host: String,
  #[serde(default = "default_port")]
  port: u16,
  #[serde(default = "default_store_path")]
  store_path: PathBuf,

  /// Search results per page.
  #[serde(default = "default_page_size")]
  page_size: usize,
  /// Recent uploads fetched per channel.
  #[serde(default = "default_uploads_page_size")]
  uploads_page_size: u32,
  /// URL-bearing descriptions folded into the link intersection.
  #[serde(default = "default_intersection_passes")]
  intersection_passes: usize,

  /// Retry backoff schedule, in seconds, indexed by attempt count.
  #[serde(default = "default_retry_delays")]
  retry_delays_seconds: Vec<u64>,
  #[serde(default = "default_batch_size")]
  queue_batch_size: usize,
  #[serde(default = "default_max_attempts")]
  queue_max_attempts: u32,
  #[serde(default = "default_poll_interval")]
  queue_poll_seconds: u64,
}

fn default_host() -> String {
  "127.0.0.1".to_string()
}
fn default_port() -> u16 {
  8080
}
fn default_store_path() -> PathBuf {
  PathBuf::from("finder.db")
}
fn default_page_size() -> usize {
  20
}
fn default_uploads_page_size() -> u32 {
  50
}
fn default_intersection_passes() -> usize {
  finder_core::extract::DEFAULT_PASSES
}
fn default_retry_delays() -> Vec<u64> {
  vec![60, 600, 3600]
}
fn default_batch_size() -> usize {
  10
}
fn default_max_attempts() -> u32 {
  8
}
fn default_poll_interval() -> u64 {
  10
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Creator finder server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("FINDER"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open SQLite store.
  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  // Upstream client.
  let youtube = YoutubeClient::new(YoutubeConfig::new(
    server_cfg.api_key.clone(),
    server_cfg.origin.clone(),
  ))
  .context("failed to build YouTube client")?;

  // Enrichment queue and its consumer task.
  let queue = JobQueue::new();
  let consumer = QueueConsumer::new(
    queue.clone(),
    store.clone(),
    Arc::new(YoutubeSource::new(
      youtube.clone(),
      server_cfg.intersection_passes,
      server_cfg.uploads_page_size,
    )),
    QueueConfig {
      delays:        server_cfg
        .retry_delays_seconds
        .iter()
        .map(|s| Duration::from_secs(*s))
        .collect(),
      batch_size:    server_cfg.queue_batch_size,
      max_attempts:  server_cfg.queue_max_attempts,
      poll_interval: Duration::from_secs(server_cfg.queue_poll_seconds),
    },
  );
  tokio::spawn(async move { consumer.run().await });

  // HTTP surface.
  let state = ApiState {
    store,
    queue,
    youtube,
    page_size: server_cfg.page_size,
  };
  let app = finder_api::api_router(state).layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
