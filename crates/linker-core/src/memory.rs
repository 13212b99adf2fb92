//! [`MemoryRegistry`]: a registry held in a plain vector and scanned linearly.
//!
//! This is the flat-file variant of the store: whatever rows were loaded are
//! kept as-is, duplicates included. Lookups surface duplicates as
//! [`MemoryError::DuplicateStudy`] instead of choosing one.

use std::cmp::Ordering;

use crate::{
  error::MemoryError,
  store::{RegistryFault, StudyRegistry},
  study::{STUDY_DATE_FORMAT, StudyKey, StudyRecord},
  worklist::{SortColumn, SortOrder, WorklistPage, WorklistQuery},
};

#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
  records: Vec<StudyRecord>,
}

impl MemoryRegistry {
  pub fn new(records: Vec<StudyRecord>) -> Self { Self { records } }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

impl RegistryFault for MemoryError {
  fn is_integrity_violation(&self) -> bool {
    matches!(self, MemoryError::DuplicateStudy { .. })
  }
}

/// ASCII-only case folding, matching SQLite's `LIKE`.
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
  haystack
    .to_ascii_lowercase()
    .contains(&needle.to_ascii_lowercase())
}

fn compare(a: &StudyRecord, b: &StudyRecord, sort: SortColumn) -> Ordering {
  let primary = match sort {
    SortColumn::SubjectId => a.subject_id.cmp(&b.subject_id),
    SortColumn::StudyDate => a.study_date.cmp(&b.study_date),
  };
  primary
    .then_with(|| a.subject_id.cmp(&b.subject_id))
    .then_with(|| a.study_date.cmp(&b.study_date))
    .then_with(|| a.modality.cmp(&b.modality))
}

impl StudyRegistry for MemoryRegistry {
  type Error = MemoryError;

  async fn find_one<'a>(
    &'a self,
    key: &'a StudyKey,
  ) -> Result<Option<StudyRecord>, MemoryError> {
    let mut hits = self.records.iter().filter(|r| {
      r.subject_id == key.subject_id
        && r.modality == key.modality
        && r.study_date.format(STUDY_DATE_FORMAT).to_string() == key.study_date
    });

    let first = hits.next();
    let extra = hits.count();
    if extra > 0 {
      return Err(MemoryError::DuplicateStudy {
        key:     key.clone(),
        matches: extra + 1,
      });
    }
    Ok(first.cloned())
  }

  async fn list_studies<'a>(
    &'a self,
    query: &'a WorklistQuery,
  ) -> Result<WorklistPage, MemoryError> {
    let query = query.clone().normalised();

    let mut rows: Vec<&StudyRecord> = self
      .records
      .iter()
      .filter(|r| {
        query
          .subject_contains
          .as_deref()
          .is_none_or(|s| contains_ignore_case(&r.subject_id, s))
      })
      .filter(|r| {
        query.date_contains.as_deref().is_none_or(|s| {
          contains_ignore_case(&r.study_date.format(STUDY_DATE_FORMAT).to_string(), s)
        })
      })
      .filter(|r| query.modality.as_deref().is_none_or(|m| r.modality == m))
      .collect();

    rows.sort_by(|a, b| {
      let ord = compare(a, b, query.sort);
      match query.order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
      }
    });

    let total = rows.len();
    let window = query.window(total);
    let items = rows
      .into_iter()
      .skip(window.offset)
      .take(window.per_page)
      .cloned()
      .collect();

    Ok(WorklistPage::new(items, window, total))
  }

  async fn count(&self) -> Result<usize, MemoryError> { Ok(self.records.len()) }
}
