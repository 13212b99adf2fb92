//! Study types: the records held by the registry and the criteria used to
//! find them.
//!
//! A study is identified by the triple (subject id, study date, modality). The
//! triple is unique across the registry, as is the external study reference
//! id. Records are written once by the import tool and never changed.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LookupError;

/// Canonical textual form of a study date in the registry and on the wire.
pub const STUDY_DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Records ─────────────────────────────────────────────────────────────────

/// One persisted study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyRecord {
  pub subject_id:         String,
  /// Serialised as `YYYY-MM-DD`.
  pub study_date:         NaiveDate,
  /// Imaging technique, e.g. `"X-ray"` or `"CT"`. Matched case-sensitively.
  pub modality:           String,
  /// Opaque key of the study in the external imaging system.
  pub study_reference_id: String,
  /// Set by the store at import time.
  pub created_at:         DateTime<Utc>,
}

impl StudyRecord {
  /// The unique lookup key of this record.
  pub fn key(&self) -> StudyKey {
    StudyKey {
      subject_id: self.subject_id.clone(),
      study_date: self.study_date.format(STUDY_DATE_FORMAT).to_string(),
      modality:   self.modality.clone(),
    }
  }
}

/// Input to a registry import. `created_at` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudy {
  pub subject_id:         String,
  pub study_date:         NaiveDate,
  pub modality:           String,
  pub study_reference_id: String,
}

impl NewStudy {
  /// Stamp the row with its creation time.
  pub fn into_record(self, created_at: DateTime<Utc>) -> StudyRecord {
    StudyRecord {
      subject_id: self.subject_id,
      study_date: self.study_date,
      modality: self.modality,
      study_reference_id: self.study_reference_id,
      created_at,
    }
  }
}

// ─── Lookup key ──────────────────────────────────────────────────────────────

/// A fully-specified, exact-match registry key.
///
/// `study_date` is kept as the caller's string: the lookup layer does not
/// reinterpret dates, so anything other than `YYYY-MM-DD` simply matches
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StudyKey {
  pub subject_id: String,
  pub study_date: String,
  pub modality:   String,
}

impl fmt::Display for StudyKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "(subject_id={:?}, study_date={:?}, modality={:?})",
      self.subject_id, self.study_date, self.modality
    )
  }
}

// ─── Criteria ────────────────────────────────────────────────────────────────

/// Inbound launch criteria as received from a client. Every field may be
/// absent; [`LaunchCriteria::validate`] turns it into a [`StudyKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LaunchCriteria {
  #[serde(default)]
  pub patient_id: Option<String>,
  #[serde(default)]
  pub study_date: Option<String>,
  #[serde(default)]
  pub modality:   Option<String>,
}

impl LaunchCriteria {
  /// Wire names of the criteria fields, in request order.
  pub const FIELDS: [&'static str; 3] = ["patient_id", "study_date", "modality"];

  pub fn new(
    patient_id: impl Into<String>,
    study_date: impl Into<String>,
    modality: impl Into<String>,
  ) -> Self {
    Self {
      patient_id: Some(patient_id.into()),
      study_date: Some(study_date.into()),
      modality:   Some(modality.into()),
    }
  }

  /// Require all three fields to be present and not blank.
  ///
  /// Values are passed through untouched: no trimming, case folding or date
  /// reformatting happens here.
  pub fn validate(&self) -> Result<StudyKey, LookupError> {
    let values = [&self.patient_id, &self.study_date, &self.modality];

    let missing: Vec<&'static str> = Self::FIELDS
      .into_iter()
      .zip(values)
      .filter(|(_, v)| v.as_deref().is_none_or(|s| s.trim().is_empty()))
      .map(|(name, _)| name)
      .collect();

    if !missing.is_empty() {
      return Err(LookupError::MissingFields(missing));
    }

    let take = |v: &Option<String>| v.clone().unwrap_or_default();
    Ok(StudyKey {
      subject_id: take(&self.patient_id),
      study_date: take(&self.study_date),
      modality:   take(&self.modality),
    })
  }
}

// ─── Launch result ───────────────────────────────────────────────────────────

/// A resolved viewer launch: the study's reference id and the URL that opens
/// it. The service only builds the URL; navigating to it is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewerLaunch {
  pub study_reference_id: String,
  pub viewer_url:         String,
}
