//! Handler for `POST /viewer`, the launch endpoint.
//!
//! | Outcome          | Status | Body |
//! |------------------|--------|------|
//! | resolved         | 200 | `{"status":"success","study_instance_uid":…,"viewer_url":…}` |
//! | missing fields   | 400 | `{"status":"error","message":"Missing required fields"}` |
//! | no match         | 404 | `{"status":"error","message":"No matching study found"}` |
//! | registry fault   | 500 | `{"status":"error","message":…}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use linker_core::{
  LookupError, LookupService,
  store::StudyRegistry,
  study::{LaunchCriteria, ViewerLaunch},
};
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct LaunchResponse {
  pub status:             &'static str,
  pub study_instance_uid: String,
  pub viewer_url:         String,
}

impl From<ViewerLaunch> for LaunchResponse {
  fn from(launch: ViewerLaunch) -> Self {
    Self {
      status:             "success",
      study_instance_uid: launch.study_reference_id,
      viewer_url:         launch.viewer_url,
    }
  }
}

/// `POST /viewer`, body: `{"patient_id":…,"study_date":…,"modality":…}`
///
/// A body that is not a JSON object of strings carries no usable criteria and
/// is answered like one with every field missing.
pub async fn launch<R>(
  State(lookup): State<Arc<LookupService<R>>>,
  body: Result<Json<LaunchCriteria>, JsonRejection>,
) -> Result<Json<LaunchResponse>, ApiError>
where
  R: StudyRegistry,
{
  let Json(criteria) = body.map_err(|rejection| {
    debug!(%rejection, "unreadable launch request body");
    LookupError::MissingFields(LaunchCriteria::FIELDS.to_vec())
  })?;

  let launch = lookup.resolve_viewer_launch(&criteria).await?;
  Ok(Json(launch.into()))
}
