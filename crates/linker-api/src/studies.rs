//! Handler for `GET /studies`, the worklist read view.
//!
//! Optional query parameters: `patient_id`, `study_date` (substring filters),
//! `modality` (exact), `sort=patient_id|study_date`, `order=asc|desc`, `page`,
//! `per_page`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};
use linker_core::{
  LookupService,
  store::StudyRegistry,
  worklist::{SortColumn, SortOrder, WorklistPage, WorklistQuery},
};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub patient_id: Option<String>,
  pub study_date: Option<String>,
  pub modality:   Option<String>,
  pub sort:       Option<SortColumn>,
  pub order:      Option<SortOrder>,
  pub page:       Option<usize>,
  pub per_page:   Option<usize>,
}

impl From<ListParams> for WorklistQuery {
  fn from(p: ListParams) -> Self {
    let defaults = WorklistQuery::default();
    WorklistQuery {
      subject_contains: p.patient_id,
      date_contains:    p.study_date,
      modality:         p.modality,
      sort:             p.sort.unwrap_or(defaults.sort),
      order:            p.order.unwrap_or(defaults.order),
      page:             p.page.unwrap_or(defaults.page),
      per_page:         p.per_page.unwrap_or(defaults.per_page),
    }
  }
}

/// `GET /studies[?patient_id=…&sort=…&page=…]`
pub async fn list<R>(
  State(lookup): State<Arc<LookupService<R>>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<WorklistPage>, ApiError>
where
  R: StudyRegistry,
{
  let Query(params) = params.map_err(|rejection| {
    debug!(%rejection, "invalid worklist query");
    ApiError::BadRequest(rejection.body_text())
  })?;

  let page = lookup.worklist(&params.into()).await?;
  Ok(Json(page))
}
