//! Error type for `linker-store-sqlite`.

use linker_core::{RegistryFault, study::StudyKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A stored date or timestamp could not be decoded.
  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// More than one stored row matches a fully-specified key.
  #[error("{matches} rows share the key {key}")]
  DuplicateStudy { key: StudyKey, matches: usize },

  /// An import row violated a table constraint; the import was rolled back.
  #[error("import row {row} {key} rejected: {reason}")]
  ImportRejected {
    /// 0-based position of the row in the import batch.
    row:    usize,
    key:    StudyKey,
    reason: String,
  },
}

impl RegistryFault for Error {
  fn is_integrity_violation(&self) -> bool {
    matches!(self, Error::DuplicateStudy { .. } | Error::DateParse(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
