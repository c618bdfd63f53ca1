//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Missing or wrong Basic credentials.
  #[error("authentication required")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// `If-Match` named a version that is no longer current.
  #[error("precondition failed")]
  PreconditionFailed,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<tontine_core::Error> for ApiError {
  fn from(e: tontine_core::Error) -> Self {
    use tontine_core::Error as E;
    match e {
      E::NotFound(m) => Self::NotFound(m),
      E::Forbidden(m) => Self::Forbidden(m),
      e @ (E::QuotaExceeded { .. } | E::CapacityReached { .. }) => {
        Self::Conflict(e.to_string())
      }
      E::Conflict(m) => Self::Conflict(m),
      E::Validation(m) => Self::BadRequest(m),
      e @ (E::Credential(_) | E::Serialization(_) | E::Store(_)) => {
        Self::Store(Box::new(e))
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
      ApiError::Store(e) => {
        tracing::error!(error = %e, "request failed");
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"tontine\""),
      );
    }
    res
  }
}
