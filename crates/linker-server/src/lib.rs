//! Process runtime for the study linker: configuration, the HTTP application
//! and the registry import tool.
//!
//! The binary in `main.rs` is a thin CLI over this library.

pub mod error;
pub mod import;

pub use error::{Error, Result};

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use config::FileFormat;
use linker_core::{LookupService, ViewerConfig, store::StudyRegistry};
use linker_store_sqlite::SqliteRegistry;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

const DEFAULTS: &str = include_str!("defaults.toml");

/// Prefix of environment variables that override configuration keys, e.g.
/// `LINKER_PORT=9000`.
pub const ENV_PREFIX: &str = "LINKER";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration.
///
/// Layered from lowest to highest precedence: built-in defaults, the TOML
/// config file, `LINKER_*` environment variables, then command-line flags.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:        String,
  pub port:        u16,
  /// Registry database file. A leading `~/` is expanded.
  pub store_path:  PathBuf,
  /// Host (or full base URL) of the external image viewer.
  pub viewer_host: String,
  /// Default tracing level; `RUST_LOG` takes precedence.
  pub log_level:   String,
}

impl ServerConfig {
  /// Load configuration from `path` (which may be absent) on top of the
  /// built-in defaults. `viewer_host` is the command-line override.
  pub fn load(path: &Path, viewer_host: Option<String>) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from_str(DEFAULTS, FileFormat::Toml))
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .set_override_option("viewer_host", viewer_host)?
      .build()?;

    Ok(settings.try_deserialize()?)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// `store_path` with a leading `~` expanded to the user's home directory.
  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn viewer(&self) -> ViewerConfig { ViewerConfig::new(&self.viewer_host) }
}

fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application ──────────────────────────────────────────────────────────────

/// Open the registry named by `cfg` and wrap it in the shared lookup service.
///
/// The registry file must already exist; serving never creates one.
pub async fn open_lookup(cfg: &ServerConfig) -> Result<Arc<LookupService<SqliteRegistry>>> {
  let path = cfg.store_path();
  if !path.is_file() {
    return Err(Error::MissingRegistry(path));
  }
  let registry = SqliteRegistry::open(&path).await?;

  let records = registry.count().await?;
  if records == 0 {
    warn!(path = %path.display(), "study registry is empty; run the import tool first");
  } else {
    info!(path = %path.display(), records, "opened study registry");
  }

  Ok(Arc::new(LookupService::new(Arc::new(registry), cfg.viewer())))
}

/// The full HTTP application: the API under `/api`, with request tracing and
/// permissive CORS for the browser-hosted worklist.
pub fn app<R>(lookup: Arc<LookupService<R>>) -> Router
where
  R: StudyRegistry + 'static,
{
  Router::new()
    .nest("/api", linker_api::api_router(lookup))
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
}
