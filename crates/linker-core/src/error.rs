//! Error types for `linker-core`.

use thiserror::Error;

use crate::study::StudyKey;

/// Boxed backend error carried by the server-fault variants of
/// [`LookupError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The outcome taxonomy of a failed launch resolution.
///
/// Every variant maps to exactly one HTTP status in the launch endpoint; the
/// lookup layer never swallows a failure or collapses two variants into one.
#[derive(Debug, Error)]
pub enum LookupError {
  /// One or more of the three criteria fields was absent or blank. The
  /// payload names the offending fields for logging only.
  #[error("missing required fields")]
  MissingFields(Vec<&'static str>),

  #[error("no matching study found")]
  NotFound,

  /// The registry holds more than one record for a fully-specified key, or a
  /// record it cannot decode.
  #[error("registry integrity violated: {0}")]
  Integrity(#[source] BoxError),

  /// The registry could not be queried at all.
  #[error("registry unavailable: {0}")]
  Connectivity(#[source] BoxError),
}

impl LookupError {
  /// `true` for outcomes caused by the server rather than the request.
  pub fn is_server_fault(&self) -> bool {
    matches!(self, Self::Integrity(_) | Self::Connectivity(_))
  }
}

/// Errors raised by [`crate::memory::MemoryRegistry`].
#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("{matches} records share the key {key}")]
  DuplicateStudy { key: StudyKey, matches: usize },
}

pub type Result<T, E = LookupError> = std::result::Result<T, E>;
