//! The registry import tool: study-list CSV → SQLite registry.
//!
//! The source file is parsed completely before the registry is touched. The
//! rows are then written in a single transaction to a staging file, which
//! replaces the live registry only after it commits. The replaced registry is
//! kept as a timestamped backup.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use linker_core::study::NewStudy;
use linker_store_sqlite::SqliteRegistry;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Backup name for `db` taken at `at`: `<stem>_<YYYYMMDD_HHMMSS>.db.bak`,
/// next to the original file.
pub fn backup_path(db: &Path, at: NaiveDateTime) -> PathBuf {
  let stem = db
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_else(|| "registry".to_owned());
  db.with_file_name(format!("{stem}_{}.db.bak", at.format("%Y%m%d_%H%M%S")))
}

/// SQLite side files that travel with a database file.
const SIDECARS: [&str; 2] = ["-wal", "-shm"];

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
  let mut name = path.as_os_str().to_owned();
  name.push(suffix);
  PathBuf::from(name)
}

/// Scratch file a replacing import is written to before it goes live.
pub fn staging_path(db: &Path) -> PathBuf { with_suffix(db, ".importing") }

/// Move an existing registry file, and any WAL side files, out of the way.
/// Returns the backup path, or `None` if there was nothing to back up.
pub fn backup_existing(db: &Path) -> Result<Option<PathBuf>> {
  if !db.exists() {
    return Ok(None);
  }
  let target = backup_path(db, Local::now().naive_local());
  let backup_err = |source| Error::Backup { path: db.to_path_buf(), source };

  std::fs::rename(db, &target).map_err(backup_err)?;
  for suffix in SIDECARS {
    let side = with_suffix(db, suffix);
    if side.exists() {
      std::fs::rename(&side, with_suffix(&target, suffix)).map_err(backup_err)?;
    }
  }
  info!(from = %db.display(), to = %target.display(), "backed up existing registry");
  Ok(Some(target))
}

/// Delete `db` and its side files; missing files are fine.
fn remove_database(db: &Path) -> Result<()> {
  let files = std::iter::once(db.to_path_buf())
    .chain(SIDECARS.iter().map(|suffix| with_suffix(db, suffix)));
  for file in files {
    match std::fs::remove_file(&file) {
      Ok(()) => {}
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(source) => return Err(Error::Stage { path: file, source }),
    }
  }
  Ok(())
}

/// What an import did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
  pub imported: usize,
  pub backup:   Option<PathBuf>,
}

/// Import the study list at `csv` into the registry at `db`.
///
/// With `backup` set, the rows are written to a fresh registry at
/// [`staging_path`]; only once that commits is the live file moved to a
/// backup and replaced. A failed import leaves the live registry as it was.
/// Without `backup`, rows are added to the existing registry in one
/// transaction, and any row colliding with an existing record fails the whole
/// import.
pub async fn run_import(db: &Path, csv: &Path, backup: bool) -> Result<ImportSummary> {
  let input = tokio::fs::read_to_string(csv)
    .await
    .map_err(|source| Error::Read { path: csv.to_path_buf(), source })?;
  let studies = linker_csv::parse(&input)?;
  info!(rows = studies.len(), csv = %csv.display(), "parsed study list");

  if !backup {
    let imported = import_into(db, studies).await?;
    info!(imported, db = %db.display(), "import complete");
    return Ok(ImportSummary { imported, backup: None });
  }

  let staging = staging_path(db);
  remove_database(&staging)?;
  let imported = match import_into(&staging, studies).await {
    Ok(n) => n,
    Err(e) => {
      remove_database(&staging)?;
      warn!(db = %db.display(), "import failed; live registry left unchanged");
      return Err(e);
    }
  };

  let backup = backup_existing(db)?;
  std::fs::rename(&staging, db).map_err(|source| Error::Stage {
    path: staging.clone(),
    source,
  })?;
  info!(imported, db = %db.display(), "import complete");

  Ok(ImportSummary { imported, backup })
}

async fn import_into(db: &Path, studies: Vec<NewStudy>) -> Result<usize> {
  let registry = SqliteRegistry::open(db).await?;
  let outcome = registry.import_studies(studies).await;
  match outcome {
    Ok(imported) => {
      registry.close().await?;
      Ok(imported)
    }
    Err(e) => {
      if let Err(close) = registry.close().await {
        warn!(error = %close, "failed to close registry after rejected import");
      }
      Err(e.into())
    }
  }
}
