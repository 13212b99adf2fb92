//! Error type for server startup and the import tool.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("failed to read {path:?}: {source}")]
  Read {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to back up {path:?}: {source}")]
  Backup {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to stage imported registry at {path:?}: {source}")]
  Stage {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("no study registry at {0:?}; run the import tool first")]
  MissingRegistry(PathBuf),

  #[error("invalid study list: {0}")]
  Csv(#[from] linker_csv::Error),

  #[error("registry error: {0}")]
  Store(#[from] linker_store_sqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
