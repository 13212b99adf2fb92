//! Error types for the linker-csv codec.

use thiserror::Error;

/// A malformed import file. Line numbers are 1-based and count the header.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("input has no header row")]
  MissingHeader,

  #[error("header is missing column {0:?}")]
  MissingColumn(&'static str),

  #[error("line {line}: unterminated quoted field")]
  UnterminatedQuote { line: usize },

  #[error("line {line}: expected {expected} fields, found {found}")]
  FieldCount {
    line:     usize,
    expected: usize,
    found:    usize,
  },

  #[error("line {line}: column {column} is empty")]
  EmptyField { line: usize, column: &'static str },

  #[error("line {line}: invalid study date {value:?} (expected YYYYMMDD)")]
  InvalidDate { line: usize, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
