//! [`MemoryStore`], a process-local [`BlobStore`] for tests and throwaway
//! instances.

use std::{
  collections::HashMap,
  convert::Infallible,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::store::{BlobStore, Collection};

/// A [`BlobStore`] held entirely in memory.
///
/// Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  blobs: Arc<Mutex<HashMap<Collection, String>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn blobs(&self) -> MutexGuard<'_, HashMap<Collection, String>> {
    self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl BlobStore for MemoryStore {
  type Error = Infallible;

  async fn get(&self, collection: Collection) -> Result<Option<String>, Infallible> {
    Ok(self.blobs().get(&collection).cloned())
  }

  async fn set(&self, collection: Collection, blob: String) -> Result<(), Infallible> {
    self.blobs().insert(collection, blob);
    Ok(())
  }
}
