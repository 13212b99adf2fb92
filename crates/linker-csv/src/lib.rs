//! Study-list CSV codec for the import tool.
//!
//! Converts the source study list (`Patient_ID`, `Study_Date` as `YYYYMMDD`,
//! `Modality`, `StudyInstanceUID`) into [`NewStudy`] rows ready for a registry
//! import. Pure synchronous; no database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! let input = "Patient_ID,Study_Date,Modality,StudyInstanceUID\nP001,20240115,CT,1.2.3\n";
//! let studies = linker_csv::parse(input).unwrap();
//! assert_eq!(studies[0].study_date.to_string(), "2024-01-15");
//! ```

pub mod error;
mod parse;

pub use error::{Error, Result};
use linker_core::study::NewStudy;
pub use parse::{
  COL_MODALITY, COL_PATIENT_ID, COL_STUDY_DATE, COL_STUDY_UID,
  normalize_study_date,
};

/// Parse a whole study list.
///
/// The first non-blank record is the header; required columns are located by
/// name, in any order, and extra columns are ignored. The first malformed row
/// fails the whole parse so a partial file is never imported.
pub fn parse(input: &str) -> Result<Vec<NewStudy>> {
  let records = parse::split_records(input)?;
  let (header, rows) = records.split_first().ok_or(Error::MissingHeader)?;
  let columns = parse::Columns::locate(header)?;

  rows.iter().map(|r| parse::map_row(r, &columns)).collect()
}
