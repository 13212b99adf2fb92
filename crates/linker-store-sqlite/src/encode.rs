//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Study dates are stored as `YYYY-MM-DD`, timestamps as RFC 3339 strings.

use chrono::{DateTime, NaiveDate, Utc};
use linker_core::study::{STUDY_DATE_FORMAT, StudyRecord};

use crate::{Error, Result};

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Study date
// ───────────────────────────────────────────────────────────────

pub fn encode_study_date(d: NaiveDate) -> String {
  d.format(STUDY_DATE_FORMAT).to_string()
}

pub fn decode_study_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, STUDY_DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("study_date {s:?}: {e}")))
}

// ─── LIKE patterns
// ────────────────────────────────────────────────────────────

/// `%needle%` with `\`, `%` and `_` escaped for `LIKE … ESCAPE '\'`.
pub fn contains_pattern(needle: &str) -> String {
  let mut out = String::with_capacity(needle.len() + 2);
  out.push('%');
  for c in needle.chars() {
    if matches!(c, '\\' | '%' | '_') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawStudy::from_row`].
pub const STUDY_COLUMNS: &str =
  "subject_id, study_date, modality, study_reference_id, created_at";

/// Raw strings read directly from a `studies` row.
pub struct RawStudy {
  pub subject_id:         String,
  pub study_date:         String,
  pub modality:           String,
  pub study_reference_id: String,
  pub created_at:         String,
}

impl RawStudy {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:         row.get(0)?,
      study_date:         row.get(1)?,
      modality:           row.get(2)?,
      study_reference_id: row.get(3)?,
      created_at:         row.get(4)?,
    })
  }

  pub fn into_record(self) -> Result<StudyRecord> {
    Ok(StudyRecord {
      subject_id:         self.subject_id,
      study_date:         decode_study_date(&self.study_date)?,
      modality:           self.modality,
      study_reference_id: self.study_reference_id,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn contains_pattern_escapes_wildcards() {
    assert_eq!(contains_pattern("P0"), "%P0%");
    assert_eq!(contains_pattern("a_b%c\\"), "%a\\_b\\%c\\\\%");
  }

  #[test]
  fn study_date_round_trips_canonical_form() {
    let d = decode_study_date("2024-01-15").unwrap();
    assert_eq!(encode_study_date(d), "2024-01-15");
    assert!(decode_study_date("20240115").is_err());
  }
}
