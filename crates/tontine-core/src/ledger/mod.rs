//! The [`Ledger`] engine.
//!
//! Every operation reads the whole collection it needs from the
//! [`BlobStore`], works on the in-memory copy and writes it back. Mutations
//! are serialised by a single async mutex so that read-modify-write sequences
//! issued through one `Ledger` never interleave.

mod activity;
mod identity;
mod payments;
mod reports;
mod tontines;

#[cfg(test)]
mod tests;

use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::{
  Error, Result,
  account::{BOOTSTRAP_ADMIN_ID, BOOTSTRAP_ADMIN_QUOTA, Role, User, UserStatus},
  activity::DEFAULT_RETENTION,
  store::{BlobStore, Collection},
  tontine::Tontine,
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// The super-administrator that exists outside the `users` collection.
#[derive(Clone)]
pub struct BootstrapAdmin {
  pub username:      String,
  pub email:         String,
  /// argon2 PHC string.
  pub password_hash: String,
}

impl std::fmt::Debug for BootstrapAdmin {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BootstrapAdmin")
      .field("username", &self.username)
      .field("email", &self.email)
      .finish_non_exhaustive()
  }
}

impl BootstrapAdmin {
  /// The synthetic user record. `owned` is the number of tontines it owns.
  fn user(&self, owned: u32) -> User {
    User {
      id:               BOOTSTRAP_ADMIN_ID,
      username:         self.username.clone(),
      email:            self.email.clone(),
      first_name:       "Super".to_owned(),
      last_name:        "Admin".to_owned(),
      phone:            None,
      role:             Role::SuperAdmin,
      status:           UserStatus::Approved,
      tontine_quota:    BOOTSTRAP_ADMIN_QUOTA,
      tontines_created: owned,
      active:           true,
      created_at:       chrono::DateTime::UNIX_EPOCH,
      approved_at:      None,
      approved_by:      None,
      last_login_at:    None,
      password_hash:    self.password_hash.clone(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct LedgerConfig {
  pub admin:                 Option<BootstrapAdmin>,
  /// Activity-log entries kept on write.
  pub activity_retention:    usize,
  /// Visitor records kept on write.
  pub visitor_retention:     usize,
  /// Seed a few example entries when the unscoped activity log is read empty.
  pub seed_example_activity: bool,
}

impl Default for LedgerConfig {
  fn default() -> Self {
    Self {
      admin:                 None,
      activity_retention:    DEFAULT_RETENTION,
      visitor_retention:     DEFAULT_RETENTION,
      seed_example_activity: true,
    }
  }
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

pub struct Ledger<S> {
  store:  S,
  config: LedgerConfig,
  write:  Mutex<()>,
}

impl<S: BlobStore> Ledger<S> {
  pub fn new(store: S, config: LedgerConfig) -> Self {
    Self { store, config, write: Mutex::new(()) }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn config(&self) -> &LedgerConfig { &self.config }

  async fn lock(&self) -> MutexGuard<'_, ()> { self.write.lock().await }

  // ── Collection I/O ────────────────────────────────────────────────────────

  /// Read and deserialise a whole collection. A collection never written
  /// reads as empty.
  async fn load<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
    let blob = self
      .store
      .get(collection)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    match blob {
      Some(blob) if !blob.trim().is_empty() => {
        let items: Vec<T> = serde_json::from_str(&blob)?;
        debug!(%collection, count = items.len(), "loaded collection");
        Ok(items)
      }
      _ => Ok(Vec::new()),
    }
  }

  async fn save<T: Serialize>(&self, collection: Collection, items: &[T]) -> Result<()> {
    let blob = serde_json::to_string(items)?;
    self
      .store
      .set(collection, blob)
      .await
      .map_err(|e| Error::Store(Box::new(e)))
  }

  async fn load_tontines(&self) -> Result<Vec<Tontine>> {
    let mut tontines: Vec<Tontine> = self.load(Collection::Tontines).await?;
    tontines.iter_mut().for_each(Tontine::normalize);
    Ok(tontines)
  }

  async fn load_users(&self) -> Result<Vec<User>> { self.load(Collection::Users).await }

  // ── Identity helpers ──────────────────────────────────────────────────────

  /// The bootstrap administrator's record, if one is configured.
  async fn bootstrap_user(&self) -> Result<Option<User>> {
    let Some(admin) = &self.config.admin else {
      return Ok(None);
    };
    let owned = self
      .load_tontines()
      .await?
      .iter()
      .filter(|t| t.owner_id == BOOTSTRAP_ADMIN_ID)
      .count();
    Ok(Some(admin.user(u32::try_from(owned).unwrap_or(u32::MAX))))
  }

  /// Look a user up by id, the bootstrap administrator included.
  pub async fn user(&self, id: u64) -> Result<Option<User>> {
    if id == BOOTSTRAP_ADMIN_ID
      && let Some(admin) = self.bootstrap_user().await?
    {
      return Ok(Some(admin));
    }
    Ok(self.load_users().await?.into_iter().find(|u| u.id == id))
  }

  /// Refuse unless `actor_id` is an administrator.
  async fn require_admin(&self, actor_id: u64) -> Result<User> {
    match self.user(actor_id).await? {
      Some(user) if user.is_admin() => Ok(user),
      _ => Err(Error::Forbidden("administrator role required".into())),
    }
  }
}

// ─── Free helpers ────────────────────────────────────────────────────────────

/// One more than the highest id in use, and never below `floor + 1`.
fn next_id(ids: impl IntoIterator<Item = u64>, floor: u64) -> u64 {
  ids.into_iter().max().unwrap_or(0).max(floor) + 1
}

/// Check that `tontine` is visible to `owner`. `None` means unscoped.
fn check_owner(tontine: &Tontine, owner: Option<u64>) -> Result<()> {
  match owner {
    Some(owner) if tontine.owner_id != owner => Err(Error::Forbidden(format!(
      "tontine {} belongs to another user",
      tontine.id
    ))),
    _ => Ok(()),
  }
}

/// Find tontine `id`, scoped to `owner`.
fn find_tontine<'a>(
  tontines: &'a [Tontine],
  id: &str,
  owner: Option<u64>,
) -> Result<&'a Tontine> {
  let tontine = tontines
    .iter()
    .find(|t| t.id == id)
    .ok_or_else(|| Error::NotFound(format!("tontine {id}")))?;
  check_owner(tontine, owner)?;
  Ok(tontine)
}

/// Find tontine `id` for mutation by `owner_id`.
fn find_tontine_mut<'a>(
  tontines: &'a mut [Tontine],
  id: &str,
  owner_id: u64,
) -> Result<&'a mut Tontine> {
  let tontine = tontines
    .iter_mut()
    .find(|t| t.id == id)
    .ok_or_else(|| Error::NotFound(format!("tontine {id}")))?;
  check_owner(tontine, Some(owner_id))?;
  Ok(tontine)
}

fn check_month(tontine: &Tontine, month: u32) -> Result<()> {
  if tontine.contains_month(month) {
    Ok(())
  } else {
    Err(Error::Validation(format!(
      "month {month} is outside 1..={}",
      tontine.duration_months
    )))
  }
}
