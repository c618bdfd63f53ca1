//! The `BlobStore` trait and the collections it holds.
//!
//! A store maps a logical table name to one JSON blob holding the whole
//! collection. There are no partial updates: the engine reads a collection,
//! mutates it in memory and writes it back wholesale. Concurrent writers are
//! not coordinated; the last write wins.

use std::future::Future;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

// ─── Collections ─────────────────────────────────────────────────────────────

/// The logical tables kept by the store. The kebab-case name is the key.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Collection {
  Tontines,
  Users,
  RegistrationRequests,
  ActivityLogs,
  Visitors,
}

impl Collection {
  /// The key under which this collection's blob is stored.
  pub fn key(self) -> &'static str { self.into() }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a key → JSON-blob store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the blob stored for `collection`, or `None` if nothing was ever
  /// written.
  fn get(
    &self,
    collection: Collection,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  /// Replace the blob stored for `collection`.
  fn set(
    &self,
    collection: Collection,
    blob: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
