//! [`SqliteRegistry`], the SQLite implementation of [`StudyRegistry`].

use std::path::Path;

use chrono::Utc;
use rusqlite::ErrorCode;
use tracing::{debug, warn};

use linker_core::{
  store::StudyRegistry,
  study::{NewStudy, StudyKey, StudyRecord},
  worklist::{SortColumn, SortOrder, WorklistPage, WorklistQuery},
};

use crate::{
  Error, Result,
  encode::{RawStudy, STUDY_COLUMNS, contains_pattern, encode_dt, encode_study_date},
  schema::SCHEMA,
};

/// Shared filter for the worklist count and page queries.
/// `?1` subject pattern, `?2` date pattern, `?3` exact modality; `NULL`
/// disables a filter.
const WORKLIST_FILTER: &str = "
  WHERE (?1 IS NULL OR subject_id LIKE ?1 ESCAPE '\\')
    AND (?2 IS NULL OR study_date LIKE ?2 ESCAPE '\\')
    AND (?3 IS NULL OR modality = ?3)";

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
  )
}

fn order_clause(sort: SortColumn, order: SortOrder) -> String {
  let dir = match order {
    SortOrder::Asc => "ASC",
    SortOrder::Desc => "DESC",
  };
  let primary = match sort {
    SortColumn::SubjectId => "subject_id",
    SortColumn::StudyDate => "study_date",
  };
  format!("ORDER BY {primary} {dir}, subject_id {dir}, study_date {dir}, modality {dir}")
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A study registry backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteRegistry {
  conn: tokio_rusqlite::Connection,
}

impl SqliteRegistry {
  /// Open (or create) a registry at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::with_connection(conn).await
  }

  /// Open an in-memory registry, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::with_connection(conn).await
  }

  pub(crate) async fn with_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Close the connection, checkpointing the write-ahead log into the
  /// database file.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert `studies` in a single transaction and return how many were
  /// written.
  ///
  /// Any constraint violation (duplicate key triple, duplicate reference id)
  /// rolls back the whole batch and is reported as
  /// [`Error::ImportRejected`]; nothing is ever overwritten.
  pub async fn import_studies(&self, studies: Vec<NewStudy>) -> Result<usize> {
    let created_at = encode_dt(Utc::now());
    let rows: Vec<[String; 4]> = studies
      .iter()
      .map(|s| {
        [
          s.subject_id.clone(),
          encode_study_date(s.study_date),
          s.modality.clone(),
          s.study_reference_id.clone(),
        ]
      })
      .collect();

    let outcome: std::result::Result<usize, (usize, String)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO studies (
               subject_id, study_date, modality, study_reference_id, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for (index, [subject, date, modality, reference]) in rows.iter().enumerate() {
            match stmt.execute(rusqlite::params![subject, date, modality, reference, created_at]) {
              Ok(_) => {}
              Err(e) if is_constraint_violation(&e) => {
                return Ok(Err((index, e.to_string())));
              }
              Err(e) => return Err(e.into()),
            }
          }
        }
        tx.commit()?;
        Ok(Ok(rows.len()))
      })
      .await?;

    match outcome {
      Ok(count) => {
        debug!(count, "imported studies");
        Ok(count)
      }
      Err((row, reason)) => {
        let s = &studies[row];
        let key = StudyKey {
          subject_id: s.subject_id.clone(),
          study_date: encode_study_date(s.study_date),
          modality:   s.modality.clone(),
        };
        warn!(row, %key, %reason, "import rejected; rolled back");
        Err(Error::ImportRejected { row, key, reason })
      }
    }
  }
}

// ─── StudyRegistry impl ──────────────────────────────────────────────────────

impl StudyRegistry for SqliteRegistry {
  type Error = Error;

  async fn find_one<'a>(&'a self, key: &'a StudyKey) -> Result<Option<StudyRecord>> {
    let subject  = key.subject_id.clone();
    let date     = key.study_date.clone();
    let modality = key.modality.clone();

    // Fetch at most two rows: enough to tell "unique" from "duplicated".
    let (mut raws, matches): (Vec<RawStudy>, usize) = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STUDY_COLUMNS} FROM studies
           WHERE subject_id = ?1 AND study_date = ?2 AND modality = ?3
           LIMIT 2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![subject, date, modality], RawStudy::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        if rows.len() < 2 {
          let n = rows.len();
          return Ok((rows, n));
        }

        let total: i64 = conn.query_row(
          "SELECT COUNT(*) FROM studies
           WHERE subject_id = ?1 AND study_date = ?2 AND modality = ?3",
          rusqlite::params![subject, date, modality],
          |r| r.get(0),
        )?;
        Ok((rows, total as usize))
      })
      .await?;

    if matches > 1 {
      return Err(Error::DuplicateStudy { key: key.clone(), matches });
    }

    raws.pop().map(RawStudy::into_record).transpose()
  }

  async fn list_studies<'a>(&'a self, query: &'a WorklistQuery) -> Result<WorklistPage> {
    let query        = query.clone().normalised();
    let subject_like = query.subject_contains.as_deref().map(contains_pattern);
    let date_like    = query.date_contains.as_deref().map(contains_pattern);
    let modality     = query.modality.clone();
    let order_by     = order_clause(query.sort, query.order);

    let (raws, total, window) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM studies {WORKLIST_FILTER}"),
          rusqlite::params![subject_like, date_like, modality],
          |r| r.get(0),
        )?;
        let total = total as usize;
        let window = query.window(total);

        let mut stmt = conn.prepare(&format!(
          "SELECT {STUDY_COLUMNS} FROM studies {WORKLIST_FILTER}
           {order_by}
           LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              subject_like,
              date_like,
              modality,
              window.per_page as i64,
              window.offset as i64,
            ],
            RawStudy::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total, window))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawStudy::into_record)
      .collect::<Result<Vec<_>>>()?;

    Ok(WorklistPage::new(items, window, total))
  }

  async fn count(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM studies", [], |r| r.get(0))?))
      .await?;
    Ok(n as usize)
  }
}
