//! Tontine and participant lifecycle.

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{Ledger, find_tontine, find_tontine_mut};
use crate::{
  Error, Result,
  account::BOOTSTRAP_ADMIN_ID,
  activity::{ActivityAction, NewActivity},
  store::{BlobStore, Collection},
  tontine::{NewParticipant, NewTontine, Participant, Tontine, TontinePatch},
};

impl<S: BlobStore> Ledger<S> {
  /// All tontines, or only those owned by `owner`.
  pub async fn list_tontines(&self, owner: Option<u64>) -> Result<Vec<Tontine>> {
    let mut tontines = self.load_tontines().await?;
    if let Some(owner) = owner {
      tontines.retain(|t| t.owner_id == owner);
    }
    debug!(?owner, count = tontines.len(), "listed tontines");
    Ok(tontines)
  }

  pub async fn get_tontine(&self, id: &str, owner: Option<u64>) -> Result<Tontine> {
    let tontines = self.load_tontines().await?;
    find_tontine(&tontines, id, owner).cloned()
  }

  /// Create a tontine for `owner_id`, charging it against their quota.
  pub async fn create_tontine(&self, input: NewTontine, owner_id: u64) -> Result<Tontine> {
    let _guard = self.lock().await;
    let owner = self
      .user(owner_id)
      .await?
      .ok_or_else(|| Error::NotFound(format!("user {owner_id}")))?;
    if owner.tontines_created >= owner.tontine_quota {
      warn!(owner_id, quota = owner.tontine_quota, "tontine quota reached");
      return Err(Error::QuotaExceeded { quota: owner.tontine_quota });
    }

    let tontine = Tontine::create(input, owner_id, Utc::now())?;
    let mut tontines = self.load_tontines().await?;
    tontines.push(tontine.clone());
    self.save(Collection::Tontines, &tontines).await?;

    // The bootstrap administrator's count is derived from ownership.
    if owner_id != BOOTSTRAP_ADMIN_ID {
      let mut users = self.load_users().await?;
      if let Some(user) = users.iter_mut().find(|u| u.id == owner_id) {
        user.tontines_created = user.tontines_created.saturating_add(1);
      }
      self.save(Collection::Users, &users).await?;
    }

    self
      .append_activity(
        NewActivity::new(
          ActivityAction::TontineCreated,
          format!("tontine \"{}\" created", tontine.name),
        )
        .tontine(&tontine.id)
        .actor(owner_id),
      )
      .await?;
    info!(tontine_id = %tontine.id, owner_id, name = %tontine.name, "tontine created");
    Ok(tontine)
  }

  /// Apply `patch` to a tontine owned by `owner_id`.
  pub async fn update_tontine(
    &self,
    id: &str,
    patch: TontinePatch,
    owner_id: u64,
  ) -> Result<Tontine> {
    let _guard = self.lock().await;
    let mut tontines = self.load_tontines().await?;
    let tontine = find_tontine_mut(&mut tontines, id, owner_id)?;
    if let Some(capacity) = patch.participant_capacity
      && (capacity as usize) < tontine.participants.len()
    {
      return Err(Error::Validation(format!(
        "capacity {capacity} is below the {} enrolled participants",
        tontine.participants.len()
      )));
    }
    tontine.apply(patch)?;
    let updated = tontine.clone();

    self.save(Collection::Tontines, &tontines).await?;
    self
      .append_activity(
        NewActivity::new(
          ActivityAction::TontineUpdated,
          format!("tontine \"{}\" updated", updated.name),
        )
        .tontine(id)
        .actor(owner_id),
      )
      .await?;
    info!(tontine_id = %id, owner_id, "tontine updated");
    Ok(updated)
  }

  /// Delete a tontine and release one unit of its owner's quota.
  pub async fn delete_tontine(&self, id: &str, owner_id: u64) -> Result<()> {
    let _guard = self.lock().await;
    let mut tontines = self.load_tontines().await?;
    let name = find_tontine(&tontines, id, Some(owner_id))?.name.clone();
    tontines.retain(|t| t.id != id);
    self.save(Collection::Tontines, &tontines).await?;

    let mut users = self.load_users().await?;
    if let Some(user) = users.iter_mut().find(|u| u.id == owner_id) {
      user.tontines_created = user.tontines_created.saturating_sub(1);
      self.save(Collection::Users, &users).await?;
    }

    self
      .append_activity(
        NewActivity::new(ActivityAction::TontineDeleted, format!("tontine \"{name}\" deleted"))
          .tontine(id)
          .actor(owner_id),
      )
      .await?;
    info!(tontine_id = %id, owner_id, "tontine deleted");
    Ok(())
  }

  // ── Participants ──────────────────────────────────────────────────────────

  /// Enrol a participant at the end of the rotation order.
  pub async fn add_participant(
    &self,
    tontine_id: &str,
    input: NewParticipant,
    owner_id: u64,
  ) -> Result<Participant> {
    let first_name = input.first_name.trim().to_owned();
    let last_name = input.last_name.trim().to_owned();
    if first_name.is_empty() && last_name.is_empty() {
      return Err(Error::Validation("a participant needs a name".into()));
    }

    let _guard = self.lock().await;
    let mut tontines = self.load_tontines().await?;
    let tontine = find_tontine_mut(&mut tontines, tontine_id, owner_id)?;
    if tontine.is_full() {
      warn!(tontine_id, capacity = tontine.participant_capacity, "tontine is full");
      return Err(Error::CapacityReached { capacity: tontine.participant_capacity });
    }

    let participant = Participant {
      id: Uuid::new_v4().to_string(),
      first_name,
      last_name,
      parts: input.parts.max(1),
      joined_at: Utc::now(),
    };
    tontine.participants.push(participant.clone());
    tontine.participant_order.push(participant.id.clone());
    let name = tontine.name.clone();

    self.save(Collection::Tontines, &tontines).await?;
    self
      .append_activity(
        NewActivity::new(
          ActivityAction::ParticipantAdded,
          format!("{} joined \"{name}\"", participant.full_name()),
        )
        .tontine(tontine_id)
        .actor(owner_id),
      )
      .await?;
    info!(tontine_id, participant_id = %participant.id, "participant added");
    Ok(participant)
  }

  /// Remove a participant along with their payments and beneficiary slots.
  pub async fn remove_participant(
    &self,
    participant_id: &str,
    tontine_id: &str,
    owner_id: u64,
  ) -> Result<()> {
    let _guard = self.lock().await;
    let mut tontines = self.load_tontines().await?;
    let tontine = find_tontine_mut(&mut tontines, tontine_id, owner_id)?;
    let removed = tontine
      .remove_participant(participant_id)
      .ok_or_else(|| Error::NotFound(format!("participant {participant_id}")))?;
    let name = tontine.name.clone();

    self.save(Collection::Tontines, &tontines).await?;
    self
      .append_activity(
        NewActivity::new(
          ActivityAction::ParticipantRemoved,
          format!("{} left \"{name}\"", removed.full_name()),
        )
        .tontine(tontine_id)
        .actor(owner_id),
      )
      .await?;
    info!(tontine_id, participant_id, "participant removed");
    Ok(())
  }
}
