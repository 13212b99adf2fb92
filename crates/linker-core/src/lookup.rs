//! [`LookupService`] resolves launch criteria to a viewer launch reference.
//!
//! Pipeline:
//!   LaunchCriteria
//!     └─ validate()            → StudyKey        (or MissingFields)
//!          └─ registry.find_one() → StudyRecord  (or NotFound / Integrity /
//!                                                 Connectivity)
//!               └─ ViewerConfig::launch_url()  → ViewerLaunch
//!
//! Lookups are pure reads and are never retried here; a failure is reported
//! once to the caller.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::{
  error::{LookupError, Result},
  store::{RegistryFault, StudyRegistry},
  study::{LaunchCriteria, ViewerLaunch},
  worklist::{WorklistPage, WorklistQuery},
};

// ─── Viewer URL ──────────────────────────────────────────────────────────────

/// Where the external image viewer lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerConfig {
  base_url: String,
}

impl ViewerConfig {
  /// Accepts a bare host (`"10.0.0.5"`, `"viewer.local:3000"`) or a full base
  /// URL. A bare host gets an `http://` scheme; trailing slashes are dropped.
  pub fn new(viewer_host: &str) -> Self {
    let trimmed = viewer_host.trim().trim_end_matches('/');
    let base_url = if trimmed.contains("://") {
      trimmed.to_owned()
    } else {
      format!("http://{trimmed}")
    };
    Self { base_url }
  }

  pub fn base_url(&self) -> &str { &self.base_url }

  /// The viewer URL opening `study_reference_id`. The id is embedded verbatim.
  pub fn launch_url(&self, study_reference_id: &str) -> String {
    format!(
      "{}/segmentation?StudyInstanceUIDs={study_reference_id}",
      self.base_url
    )
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Validates criteria, queries the injected registry and builds launch URLs.
///
/// Holds no mutable state; one instance is shared across all requests.
pub struct LookupService<R> {
  registry: Arc<R>,
  viewer:   ViewerConfig,
}

impl<R> Clone for LookupService<R> {
  fn clone(&self) -> Self {
    Self {
      registry: Arc::clone(&self.registry),
      viewer:   self.viewer.clone(),
    }
  }
}

fn classify<E: RegistryFault>(e: E) -> LookupError {
  if e.is_integrity_violation() {
    LookupError::Integrity(Box::new(e))
  } else {
    LookupError::Connectivity(Box::new(e))
  }
}

impl<R: StudyRegistry> LookupService<R> {
  pub fn new(registry: Arc<R>, viewer: ViewerConfig) -> Self {
    Self { registry, viewer }
  }

  pub fn registry(&self) -> &R { &self.registry }

  pub fn viewer(&self) -> &ViewerConfig { &self.viewer }

  /// Resolve `criteria` to exactly one study and its viewer URL.
  pub async fn resolve_viewer_launch(
    &self,
    criteria: &LaunchCriteria,
  ) -> Result<ViewerLaunch> {
    let key = criteria.validate().inspect_err(|e| {
      debug!(error = ?e, "rejected launch criteria");
    })?;

    let record = match self.registry.find_one(&key).await {
      Ok(Some(record)) => record,
      Ok(None) => {
        info!(%key, "no study matches launch criteria");
        return Err(LookupError::NotFound);
      }
      Err(e) => {
        let err = classify(e);
        match &err {
          LookupError::Integrity(source) => {
            error!(%key, error = %source, "study registry integrity violation");
          }
          other => error!(%key, error = %other, "study registry lookup failed"),
        }
        return Err(err);
      }
    };

    let viewer_url = self.viewer.launch_url(&record.study_reference_id);
    debug!(%key, study_reference_id = %record.study_reference_id, "resolved viewer launch");

    Ok(ViewerLaunch {
      study_reference_id: record.study_reference_id,
      viewer_url,
    })
  }

  /// One page of the worklist view.
  pub async fn worklist(&self, query: &WorklistQuery) -> Result<WorklistPage> {
    self.registry.list_studies(query).await.map_err(|e| {
      let err = classify(e);
      error!(error = %err, "worklist query failed");
      err
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, Utc};

  use super::*;
  use crate::{memory::MemoryRegistry, study::NewStudy};

  fn scenario_store() -> MemoryRegistry {
    MemoryRegistry::new(vec![
      NewStudy {
        subject_id:         "P001".into(),
        study_date:         NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        modality:           "CT".into(),
        study_reference_id: "UID123".into(),
      }
      .into_record(Utc::now()),
      NewStudy {
        subject_id:         "P001".into(),
        study_date:         NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        modality:           "X-ray".into(),
        study_reference_id: "1.2.840.113619.2.55".into(),
      }
      .into_record(Utc::now()),
    ])
  }

  fn service(registry: MemoryRegistry) -> LookupService<MemoryRegistry> {
    LookupService::new(Arc::new(registry), ViewerConfig::new("192.168.44.190"))
  }

  // ─── Viewer URL ──────────────────────────────────────────────────────────

  #[test]
  fn bare_host_gets_http_scheme() {
    let cfg = ViewerConfig::new("192.168.44.190");
    assert_eq!(
      cfg.launch_url("UID123"),
      "http://192.168.44.190/segmentation?StudyInstanceUIDs=UID123"
    );
  }

  #[test]
  fn full_base_url_is_kept_without_trailing_slash() {
    let cfg = ViewerConfig::new("https://viewer.example.org/ohif/");
    assert_eq!(cfg.base_url(), "https://viewer.example.org/ohif");
    assert_eq!(
      cfg.launch_url("1.2.3"),
      "https://viewer.example.org/ohif/segmentation?StudyInstanceUIDs=1.2.3"
    );
  }

  // ─── Resolution ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn resolves_unique_match() {
    let svc = service(scenario_store());
    let launch = svc
      .resolve_viewer_launch(&LaunchCriteria::new("P001", "2024-01-15", "CT"))
      .await
      .unwrap();

    assert_eq!(launch.study_reference_id, "UID123");
    assert!(launch.viewer_url.ends_with("StudyInstanceUIDs=UID123"));
  }

  #[tokio::test]
  async fn reference_id_appears_verbatim_in_url() {
    let svc = service(scenario_store());
    let launch = svc
      .resolve_viewer_launch(&LaunchCriteria::new("P001", "2024-01-15", "X-ray"))
      .await
      .unwrap();
    assert!(launch.viewer_url.contains(&launch.study_reference_id));
  }

  #[tokio::test]
  async fn unknown_modality_is_not_found() {
    let svc = service(scenario_store());
    let err = svc
      .resolve_viewer_launch(&LaunchCriteria::new("P001", "2024-01-15", "MRI"))
      .await
      .unwrap_err();
    assert!(matches!(err, LookupError::NotFound));
    assert!(!err.is_server_fault());
  }

  #[tokio::test]
  async fn any_missing_field_fails_validation() {
    let svc = service(scenario_store());
    let complete = LaunchCriteria::new("P001", "2024-01-15", "CT");

    let variants = [
      LaunchCriteria { patient_id: None, ..complete.clone() },
      LaunchCriteria { study_date: Some(String::new()), ..complete.clone() },
      LaunchCriteria { modality: None, ..complete.clone() },
      LaunchCriteria::default(),
    ];

    for criteria in variants {
      let err = svc.resolve_viewer_launch(&criteria).await.unwrap_err();
      assert!(matches!(err, LookupError::MissingFields(_)), "{criteria:?}");
    }
  }

  #[tokio::test]
  async fn duplicate_records_are_a_server_fault() {
    let mut records = vec![];
    for uid in ["A", "B"] {
      records.push(
        NewStudy {
          subject_id:         "P001".into(),
          study_date:         NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
          modality:           "CT".into(),
          study_reference_id: uid.into(),
        }
        .into_record(Utc::now()),
      );
    }
    let svc = service(MemoryRegistry::new(records));

    let err = svc
      .resolve_viewer_launch(&LaunchCriteria::new("P001", "2024-01-15", "CT"))
      .await
      .unwrap_err();
    assert!(matches!(err, LookupError::Integrity(_)));
    assert!(err.is_server_fault());
  }

  #[tokio::test]
  async fn repeated_lookups_are_identical_and_do_not_mutate() {
    let svc = service(scenario_store());
    let criteria = LaunchCriteria::new("P001", "2024-01-15", "CT");

    let first = svc.resolve_viewer_launch(&criteria).await.unwrap();
    let second = svc.resolve_viewer_launch(&criteria).await.unwrap();
    let _ = svc
      .resolve_viewer_launch(&LaunchCriteria::new("P404", "2024-01-15", "CT"))
      .await;

    assert_eq!(first, second);
    assert_eq!(svc.registry().count().await.unwrap(), 2);
  }
}
