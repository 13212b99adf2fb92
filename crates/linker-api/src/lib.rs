//! JSON HTTP API for the study linker.
//!
//! Exposes an axum [`Router`] backed by a [`LookupService`] over any
//! [`StudyRegistry`]. TLS, CORS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", linker_api::api_router(lookup.clone()))
//! ```

pub mod error;
pub mod health;
pub mod studies;
pub mod viewer;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use linker_core::{LookupService, store::StudyRegistry};

pub use error::ApiError;

/// Build a fully-materialised API router for `lookup`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<R>(lookup: Arc<LookupService<R>>) -> Router<()>
where
  R: StudyRegistry + 'static,
{
  Router::new()
    .route("/viewer", post(viewer::launch::<R>))
    .route("/health", get(health::handler))
    .route("/studies", get(studies::list::<R>))
    .with_state(lookup)
}

#[cfg(test)]
mod tests {
  use std::fmt;

  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
  };
  use chrono::{NaiveDate, Utc};
  use linker_core::{
    RegistryFault, ViewerConfig,
    memory::MemoryRegistry,
    study::{NewStudy, StudyKey, StudyRecord},
    worklist::{WorklistPage, WorklistQuery},
  };
  use linker_store_sqlite::SqliteRegistry;
  use serde_json::{Value, json};
  use tower::ServiceExt;

  use super::*;
  use crate::error::{MSG_INTEGRITY, MSG_MISSING_FIELDS, MSG_NOT_FOUND, MSG_UNAVAILABLE};

  const VIEWER_HOST: &str = "192.168.44.190";

  fn study(subject: &str, date: (i32, u32, u32), modality: &str, uid: &str) -> NewStudy {
    NewStudy {
      subject_id:         subject.into(),
      study_date:         NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
      modality:           modality.into(),
      study_reference_id: uid.into(),
    }
  }

  fn router<R: StudyRegistry + 'static>(registry: R) -> Router {
    api_router(Arc::new(LookupService::new(
      Arc::new(registry),
      ViewerConfig::new(VIEWER_HOST),
    )))
  }

  async fn sqlite_router(studies: Vec<NewStudy>) -> Router {
    let registry = SqliteRegistry::open_in_memory().await.unwrap();
    registry.import_studies(studies).await.unwrap();
    router(registry)
  }

  async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  fn post_viewer(body: impl Into<Body>) -> Request<Body> {
    Request::post("/viewer")
      .header(header::CONTENT_TYPE, "application/json")
      .body(body.into())
      .unwrap()
  }

  fn post_json(body: Value) -> Request<Body> { post_viewer(body.to_string()) }

  // ─── Launch ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn launch_resolves_unique_study() {
    let app = sqlite_router(vec![study("P001", (2024, 1, 15), "CT", "UID123")]).await;
    let (status, body) = send(
      app,
      post_json(json!({
        "patient_id": "P001", "study_date": "2024-01-15", "modality": "CT"
      })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["study_instance_uid"], "UID123");
    assert_eq!(
      body["viewer_url"],
      "http://192.168.44.190/segmentation?StudyInstanceUIDs=UID123"
    );
  }

  #[tokio::test]
  async fn launch_without_match_is_404() {
    let app = sqlite_router(vec![study("P001", (2024, 1, 15), "X-ray", "UID1")]).await;
    let (status, body) = send(
      app,
      post_json(json!({
        "patient_id": "P001", "study_date": "2024-01-15", "modality": "MRI"
      })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "status": "error", "message": MSG_NOT_FOUND }));
  }

  #[tokio::test]
  async fn launch_with_missing_field_is_400() {
    let app = sqlite_router(vec![study("P001", (2024, 1, 15), "CT", "UID123")]).await;
    let (status, body) = send(
      app,
      post_json(json!({ "patient_id": "P001", "study_date": "2024-01-15" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "status": "error", "message": MSG_MISSING_FIELDS }));
  }

  #[tokio::test]
  async fn launch_with_malformed_body_is_400() {
    let app = sqlite_router(vec![]).await;
    let (status, body) = send(app, post_viewer("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], MSG_MISSING_FIELDS);

    let app = sqlite_router(vec![]).await;
    let (status, _) = send(
      app,
      post_json(json!({ "patient_id": 1, "study_date": "2024-01-15", "modality": "CT" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn duplicate_records_are_a_500_integrity_error() {
    let records = vec![
      study("P001", (2024, 1, 15), "CT", "UID123").into_record(Utc::now()),
      study("P001", (2024, 1, 15), "CT", "UID999").into_record(Utc::now()),
    ];
    let app = router(MemoryRegistry::new(records));
    let (status, body) = send(
      app,
      post_json(json!({
        "patient_id": "P001", "study_date": "2024-01-15", "modality": "CT"
      })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "status": "error", "message": MSG_INTEGRITY }));
  }

  // ─── Unreachable registry ────────────────────────────────────────────────

  #[derive(Debug)]
  struct Offline;

  impl fmt::Display for Offline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str("unable to open database file")
    }
  }

  impl std::error::Error for Offline {}

  impl RegistryFault for Offline {
    fn is_integrity_violation(&self) -> bool { false }
  }

  struct OfflineRegistry;

  impl StudyRegistry for OfflineRegistry {
    type Error = Offline;

    async fn find_one<'a>(&'a self, _: &'a StudyKey) -> Result<Option<StudyRecord>, Offline> {
      Err(Offline)
    }

    async fn list_studies<'a>(&'a self, _: &'a WorklistQuery) -> Result<WorklistPage, Offline> {
      Err(Offline)
    }

    async fn count(&self) -> Result<usize, Offline> { Err(Offline) }
  }

  #[tokio::test]
  async fn unreachable_registry_is_a_500_without_details() {
    let (status, body) = send(
      router(OfflineRegistry),
      post_json(json!({
        "patient_id": "P001", "study_date": "2024-01-15", "modality": "CT"
      })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], MSG_UNAVAILABLE);
    assert!(!body.to_string().contains("database file"));
  }

  // ─── Health ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_needs_no_registry() {
    let req = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = send(router(OfflineRegistry), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));
  }

  // ─── Worklist ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn studies_are_filtered_sorted_and_paged() {
    let app = sqlite_router(vec![
      study("P002", (2024, 3, 1), "CT", "u1"),
      study("P001", (2024, 1, 15), "X-ray", "u2"),
      study("P001", (2024, 1, 15), "CT", "u3"),
      study("Q100", (2023, 12, 31), "CT", "u4"),
    ])
    .await;

    let req = Request::get("/studies?modality=CT&sort=patient_id&order=desc&per_page=2")
      .body(Body::empty())
      .unwrap();
    let (status, body) = send(app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["items"][0]["study_reference_id"], "u4");
    assert_eq!(body["items"][1]["study_reference_id"], "u1");
    assert_eq!(body["items"][0]["study_date"], "2023-12-31");
  }

  #[tokio::test]
  async fn studies_reject_unknown_sort_column() {
    let app = sqlite_router(vec![]).await;
    let req = Request::get("/studies?sort=created_at").body(Body::empty()).unwrap();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
  }

  // ─── Import to launch ────────────────────────────────────────────────────

  #[tokio::test]
  async fn imported_csv_dates_are_launchable_in_iso_form() {
    let csv = "Patient_ID,Study_Date,Modality,StudyInstanceUID\nP001,20240115,CT,UID123\n";
    let app = sqlite_router(linker_csv::parse(csv).unwrap()).await;

    let (status, body) = send(
      app,
      post_json(json!({
        "patient_id": "P001", "study_date": "2024-01-15", "modality": "CT"
      })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["study_instance_uid"], "UID123");
  }
}
