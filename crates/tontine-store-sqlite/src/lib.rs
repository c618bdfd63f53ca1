//! SQLite backend for the tontine ledger.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each collection is one row holding the
//! whole JSON blob.

mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{BlobMeta, SqliteStore};
