//! The `StudyRegistry` trait: the registry store contract.
//!
//! The trait is implemented by storage backends (`linker-store-sqlite`, and
//! [`crate::memory::MemoryRegistry`]). The lookup service and the HTTP layer
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  study::{StudyKey, StudyRecord},
  worklist::{WorklistPage, WorklistQuery},
};

/// Lets the lookup layer tell a corrupted registry apart from an unreachable
/// one without knowing the backend.
pub trait RegistryFault: std::error::Error + Send + Sync + 'static {
  /// `true` if the error reports corrupt registry data (duplicate or
  /// undecodable records) rather than a failure to reach the storage.
  fn is_integrity_violation(&self) -> bool;
}

/// Read access to the persisted study registry.
///
/// Serving is read-only: no method here mutates the registry, so a single
/// handle can be shared freely across concurrent requests. Records are written
/// only by the backend-specific import path.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait StudyRegistry: Send + Sync {
  type Error: RegistryFault;

  /// Exact, case-sensitive match on all three key fields.
  ///
  /// Returns `Ok(None)` if nothing matches. If the storage holds more than
  /// one record for `key`, returns an error for which
  /// [`RegistryFault::is_integrity_violation`] is `true`; it never picks one.
  fn find_one<'a>(
    &'a self,
    key: &'a StudyKey,
  ) -> impl Future<Output = Result<Option<StudyRecord>, Self::Error>> + Send + 'a;

  /// Filter, sort and paginate all records for the worklist view.
  fn list_studies<'a>(
    &'a self,
    query: &'a WorklistQuery,
  ) -> impl Future<Output = Result<WorklistPage, Self::Error>> + Send + 'a;

  /// Total number of stored records.
  fn count(&self) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
