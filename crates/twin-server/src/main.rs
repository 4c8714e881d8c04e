//! Digital twin server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `TWIN_*` environment variables, loads the owner's profile, and serves the
//! chat API over HTTP.
//!
//! # Notification sweep
//!
//! To alert the owner about every stored session, e.g. from a scheduled job:
//!
//! ```
//! cargo run -p twin-server --bin server -- notify-all
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use twin_core::session::Sessions;
use twin_server::{
  AppState,
  backend::Storage,
  llm::OpenAiClient,
  notify::NtfyNotifier,
  profile::Profile,
  settings::{ServerConfig, StorageConfig},
  sweep,
};

#[derive(Parser)]
#[command(author, version, about = "Digital twin chat server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Send a contact alert for every stored session and exit.
  NotifyAll,
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
  let config = load_config(&cli.config)?;

  // Open the session store.
  let storage = Storage::open(&config.storage)
    .await
    .with_context(|| format!("failed to open {} storage", config.storage.label()))?;
  tracing::info!(backend = config.storage.label(), "storage ready");
  let store = Arc::new(storage);

  let notifier = NtfyNotifier::new(&config.notify).context("failed to build notifier")?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::NotifyAll => {
      let report = sweep::notify_all(&Sessions::new(store), &notifier)
        .await
        .context("notification sweep failed")?;
      if report.failed > 0 {
        anyhow::bail!("{} of {} notifications failed", report.failed, report.failed + report.notified);
      }
      Ok(())
    }
    Command::Serve => serve(config, store, notifier).await,
  }
}

async fn serve(
  config: ServerConfig,
  store: Arc<Storage>,
  notifier: NtfyNotifier,
) -> anyhow::Result<()> {
  let profile = Profile::load(&config.profile_dir)
    .await
    .with_context(|| format!("failed to load profile from {:?}", config.profile_dir))?;
  let llm = OpenAiClient::new(config.llm.clone()).context("failed to build model client")?;

  let state = AppState::new(store, llm, notifier, profile, config.storage.label());
  let app = twin_server::router(state, &config.cors_origins);
  let address = format!("{}:{}", config.host, config.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("TWIN")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("cors_origins"),
    )
    .build()
    .context("failed to read config file")?;

  let mut config: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if config.llm.api_key.is_none() {
    config.llm.api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
  }
  config.profile_dir = expand_tilde(&config.profile_dir);
  if let StorageConfig::Local { memory_dir } = &mut config.storage {
    *memory_dir = expand_tilde(memory_dir);
  }
  Ok(config)
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
