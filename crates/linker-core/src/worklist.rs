//! Worklist read view: filter, sort and paginate the whole registry.
//!
//! This is the contract the worklist client consumes to render its study
//! list. It never participates in launch resolution.

use serde::{Deserialize, Serialize};

use crate::study::StudyRecord;

pub const DEFAULT_PER_PAGE: usize = 20;
pub const MAX_PER_PAGE: usize = 200;

/// Sortable worklist columns. Ties are always broken by the full study key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortColumn {
  #[serde(rename = "patient_id")]
  SubjectId,
  #[default]
  #[serde(rename = "study_date")]
  StudyDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  #[default]
  Asc,
  Desc,
}

/// Parameters for [`crate::store::StudyRegistry::list_studies`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorklistQuery {
  /// Substring of the subject id. Case is folded for ASCII letters only.
  pub subject_contains: Option<String>,
  /// Substring of the `YYYY-MM-DD` date, folded like `subject_contains`.
  pub date_contains:    Option<String>,
  /// Exact modality.
  pub modality:         Option<String>,
  pub sort:             SortColumn,
  pub order:            SortOrder,
  /// 1-based; clamped into range by [`WorklistQuery::window`].
  pub page:             usize,
  pub per_page:         usize,
}

impl Default for WorklistQuery {
  fn default() -> Self {
    Self {
      subject_contains: None,
      date_contains:    None,
      modality:         None,
      sort:             SortColumn::default(),
      order:            SortOrder::default(),
      page:             1,
      per_page:         DEFAULT_PER_PAGE,
    }
  }
}

/// The concrete slice of a filtered result set selected by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
  pub page:        usize,
  pub per_page:    usize,
  pub total_pages: usize,
  pub offset:      usize,
}

impl WorklistQuery {
  /// Resolve the page to return given `total` matching rows.
  ///
  /// `per_page` is clamped to `1..=MAX_PER_PAGE`, `page` to
  /// `1..=max(1, total_pages)`.
  pub fn window(&self, total: usize) -> PageWindow {
    let per_page = self.per_page.clamp(1, MAX_PER_PAGE);
    let total_pages = total.div_ceil(per_page);
    let page = self.page.clamp(1, total_pages.max(1));
    PageWindow {
      page,
      per_page,
      total_pages,
      offset: (page - 1) * per_page,
    }
  }

  /// Blank filters behave as if they were absent.
  pub fn normalised(mut self) -> Self {
    let blank_to_none =
      |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    self.subject_contains = blank_to_none(self.subject_contains);
    self.date_contains = blank_to_none(self.date_contains);
    self.modality = blank_to_none(self.modality);
    self
  }
}

/// One page of the worklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorklistPage {
  pub items:       Vec<StudyRecord>,
  pub page:        usize,
  pub per_page:    usize,
  pub total:       usize,
  pub total_pages: usize,
}

impl WorklistPage {
  pub fn new(items: Vec<StudyRecord>, window: PageWindow, total: usize) -> Self {
    Self {
      items,
      page: window.page,
      per_page: window.per_page,
      total,
      total_pages: window.total_pages,
    }
  }
}
