//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Client-facing messages are fixed strings. Details of server faults stay in
//! the logs.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use linker_core::LookupError;
use serde_json::json;
use thiserror::Error;

pub const MSG_MISSING_FIELDS: &str = "Missing required fields";
pub const MSG_NOT_FOUND: &str = "No matching study found";
pub const MSG_INTEGRITY: &str = "Study registry integrity error";
pub const MSG_UNAVAILABLE: &str = "Study registry unavailable";
pub const MSG_BAD_QUERY: &str = "Invalid query parameters";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Lookup(#[from] LookupError),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Lookup(LookupError::MissingFields(_)) => StatusCode::BAD_REQUEST,
      ApiError::Lookup(LookupError::NotFound) => StatusCode::NOT_FOUND,
      ApiError::Lookup(LookupError::Integrity(_) | LookupError::Connectivity(_)) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  /// The message shown to the client.
  pub fn client_message(&self) -> &'static str {
    match self {
      ApiError::BadRequest(_) => MSG_BAD_QUERY,
      ApiError::Lookup(LookupError::MissingFields(_)) => MSG_MISSING_FIELDS,
      ApiError::Lookup(LookupError::NotFound) => MSG_NOT_FOUND,
      ApiError::Lookup(LookupError::Integrity(_)) => MSG_INTEGRITY,
      ApiError::Lookup(LookupError::Connectivity(_)) => MSG_UNAVAILABLE,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = json!({ "status": "error", "message": self.client_message() });
    (status, Json(body)).into_response()
  }
}
