//! Error type for `tontine-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A row whose key names no known collection.
  #[error("unknown collection key: {0}")]
  UnknownCollection(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
