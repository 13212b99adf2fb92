//! linker-server binary.
//!
//! `serve` (the default) opens the study registry and serves the lookup API.
//! `import <csv>` rebuilds the registry from a study-list CSV.
//!
//! ```text
//! linker-server --config config.toml serve
//! linker-server import studies.csv
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use linker_server::{ServerConfig, app, import, open_lookup};
use tokio::{net::TcpListener, signal};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "PACS study lookup and viewer launch service")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Host or base URL of the image viewer.
  #[arg(long, env = "VIEWER_HOST")]
  viewer_host: Option<String>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (default).
  Serve,
  /// Rebuild the registry from a study-list CSV.
  Import {
    /// `Patient_ID,Study_Date,Modality,StudyInstanceUID` file.
    csv: PathBuf,

    /// Add to the existing registry instead of moving it to a backup first.
    #[arg(long)]
    no_backup: bool,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let cfg = ServerConfig::load(&cli.config, cli.viewer_host)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  // Initialise tracing.
  let level: LevelFilter = cfg
    .log_level
    .parse()
    .with_context(|| format!("invalid log_level {:?}", cfg.log_level))?;
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy(),
    )
    .init();

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(cfg).await,
    Command::Import { csv, no_backup } => {
      import::run_import(&cfg.store_path(), &csv, !no_backup)
        .await
        .with_context(|| format!("failed to import {csv:?}"))?;
      Ok(())
    }
  }
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  let lookup = open_lookup(&cfg)
    .await
    .context("failed to open study registry")?;

  let app = app(lookup);
  let address = cfg.address();

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  info!(viewer = %cfg.viewer().base_url(), "Listening on http://{address}");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  info!("server stopped");
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to listen for ctrl-c");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
  info!("shutdown signal received");
}
