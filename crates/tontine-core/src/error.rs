//! Error types for `tontine-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("not found: {0}")]
  NotFound(String),

  /// The resource exists but the acting user may not touch it.
  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("tontine quota of {quota} reached")]
  QuotaExceeded { quota: u32 },

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("participant capacity of {capacity} reached")]
  CapacityReached { capacity: u32 },

  #[error("invalid input: {0}")]
  Validation(String),

  #[error("credential error: {0}")]
  Credential(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
