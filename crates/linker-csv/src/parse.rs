//! Study-list CSV parser.
//!
//! Pipeline:
//!   raw &str
//!     └─ split_records()     → Vec<Record>   (quote-aware, CRLF/LF)
//!          └─ Columns::locate() → header positions
//!               └─ map_row()     → NewStudy  (date normalised)

use chrono::NaiveDate;
use linker_core::study::NewStudy;

use crate::error::{Error, Result};

pub const COL_PATIENT_ID: &str = "Patient_ID";
pub const COL_STUDY_DATE: &str = "Study_Date";
pub const COL_MODALITY: &str = "Modality";
pub const COL_STUDY_UID: &str = "StudyInstanceUID";

/// Date layout used by the source file.
const SOURCE_DATE_FORMAT: &str = "%Y%m%d";

// ─── Records ─────────────────────────────────────────────────────────────────

/// One logical CSV record and the line it starts on.
pub(crate) struct Record {
  pub line:   usize,
  pub fields: Vec<String>,
}

/// Split `input` into records, honouring `"`-quoted fields (which may contain
/// commas, newlines and `""` escapes). Blank lines are skipped.
pub(crate) fn split_records(input: &str) -> Result<Vec<Record>> {
  let input = input.strip_prefix('\u{feff}').unwrap_or(input);

  let mut records = Vec::new();
  let mut fields: Vec<String> = Vec::new();
  let mut field = String::new();
  let mut in_quotes = false;
  let mut line = 1usize;
  let mut start_line = 1usize;
  let mut chars = input.chars().peekable();

  while let Some(c) = chars.next() {
    if in_quotes {
      match c {
        '"' if chars.peek() == Some(&'"') => {
          chars.next();
          field.push('"');
        }
        '"' => in_quotes = false,
        '\n' => {
          line += 1;
          field.push('\n');
        }
        _ => field.push(c),
      }
      continue;
    }

    match c {
      '"' => in_quotes = true,
      ',' => fields.push(std::mem::take(&mut field)),
      '\r' if chars.peek() == Some(&'\n') => {}
      '\n' => {
        fields.push(std::mem::take(&mut field));
        push_record(&mut records, start_line, std::mem::take(&mut fields));
        line += 1;
        start_line = line;
      }
      _ => field.push(c),
    }
  }

  if in_quotes {
    return Err(Error::UnterminatedQuote { line: start_line });
  }
  fields.push(field);
  push_record(&mut records, start_line, fields);

  Ok(records)
}

fn push_record(records: &mut Vec<Record>, line: usize, fields: Vec<String>) {
  let blank = fields.len() == 1 && fields[0].trim().is_empty();
  if !blank {
    records.push(Record { line, fields });
  }
}

// ─── Header ──────────────────────────────────────────────────────────────────

/// Positions of the required columns within a record.
pub(crate) struct Columns {
  width:      usize,
  patient_id: usize,
  study_date: usize,
  modality:   usize,
  study_uid:  usize,
}

impl Columns {
  pub(crate) fn locate(header: &Record) -> Result<Self> {
    let find = |name: &'static str| {
      header
        .fields
        .iter()
        .position(|h| h.trim() == name)
        .ok_or(Error::MissingColumn(name))
    };
    Ok(Self {
      width:      header.fields.len(),
      patient_id: find(COL_PATIENT_ID)?,
      study_date: find(COL_STUDY_DATE)?,
      modality:   find(COL_MODALITY)?,
      study_uid:  find(COL_STUDY_UID)?,
    })
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// Convert a `YYYYMMDD` source date into a calendar date.
pub fn normalize_study_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  NaiveDate::parse_from_str(raw, SOURCE_DATE_FORMAT).ok()
}

pub(crate) fn map_row(record: &Record, cols: &Columns) -> Result<NewStudy> {
  if record.fields.len() != cols.width {
    return Err(Error::FieldCount {
      line:     record.line,
      expected: cols.width,
      found:    record.fields.len(),
    });
  }

  let get = |idx: usize, column: &'static str| -> Result<String> {
    let value = record.fields[idx].trim();
    if value.is_empty() {
      Err(Error::EmptyField { line: record.line, column })
    } else {
      Ok(value.to_owned())
    }
  };

  let raw_date = get(cols.study_date, COL_STUDY_DATE)?;
  let study_date = normalize_study_date(&raw_date).ok_or_else(|| Error::InvalidDate {
    line:  record.line,
    value: raw_date,
  })?;

  Ok(NewStudy {
    subject_id: get(cols.patient_id, COL_PATIENT_ID)?,
    study_date,
    modality: get(cols.modality, COL_MODALITY)?,
    study_reference_id: get(cols.study_uid, COL_STUDY_UID)?,
  })
}
