//! [`SqliteStore`], the SQLite implementation of [`BlobStore`].

use std::{path::Path, str::FromStr};

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;

use tontine_core::store::{BlobStore, Collection};

use crate::{Error, Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A tontine blob store backed by a single SQLite file.
///
/// Clones share the same connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Bookkeeping kept next to each blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobMeta {
  /// 1 after the first write, incremented by every later one.
  pub version:    u64,
  pub updated_at: DateTime<Utc>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Version and last write time of `collection`, or `None` if it was never
  /// written.
  pub async fn meta(&self, collection: Collection) -> Result<Option<BlobMeta>> {
    let key = collection.key();
    let row: Option<(i64, String)> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT version, updated_at FROM collections WHERE key = ?1",
            rusqlite::params![key],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        Ok(row)
      })
      .await?;

    row
      .map(|(version, updated_at)| {
        Ok(BlobMeta {
          version:    u64::try_from(version).unwrap_or_default(),
          updated_at: decode_dt(&updated_at)?,
        })
      })
      .transpose()
  }

  /// Every collection that has been written at least once, in key order.
  pub async fn collections(&self) -> Result<Vec<Collection>> {
    let keys: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT key FROM collections ORDER BY key")?;
        let keys = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
      })
      .await?;

    keys
      .into_iter()
      .map(|key| Collection::from_str(&key).map_err(|_| Error::UnknownCollection(key)))
      .collect()
  }
}

fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── BlobStore impl ──────────────────────────────────────────────────────────

impl BlobStore for SqliteStore {
  type Error = Error;

  async fn get(&self, collection: Collection) -> Result<Option<String>> {
    let key = collection.key();
    let blob: Option<String> = self
      .conn
      .call(move |conn| {
        let blob = conn
          .query_row(
            "SELECT blob FROM collections WHERE key = ?1",
            rusqlite::params![key],
            |r| r.get(0),
          )
          .optional()?;
        Ok(blob)
      })
      .await?;
    Ok(blob)
  }

  async fn set(&self, collection: Collection, blob: String) -> Result<()> {
    let key = collection.key();
    let at_str = Utc::now().to_rfc3339();
    let bytes = blob.len();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO collections (key, blob, version, updated_at)
           VALUES (?1, ?2, 1, ?3)
           ON CONFLICT (key) DO UPDATE SET
             blob       = excluded.blob,
             version    = collections.version + 1,
             updated_at = excluded.updated_at",
          rusqlite::params![key, blob, at_str],
        )?;
        Ok(())
      })
      .await?;

    debug!(%collection, bytes, "collection written");
    Ok(())
  }
}
