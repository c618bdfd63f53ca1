//! The activity log and visitor telemetry.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{Ledger, next_id};
use crate::{
  Result,
  activity::{
    ActivityAction, ActivityEntry, NewActivity, NewVisit, SYSTEM_ACTOR, UNKNOWN_ACTOR,
    Visitor, VisitorStats,
  },
  store::{BlobStore, Collection},
};

const EXAMPLE_ACTIVITY: [(ActivityAction, &str); 3] = [
  (ActivityAction::TontineCreated, "example tontine \"Famille\" created"),
  (ActivityAction::ParticipantAdded, "example participant joined \"Famille\""),
  (ActivityAction::PaymentUpdated, "example payment recorded for month 1"),
];

impl<S: BlobStore> Ledger<S> {
  /// Append an entry to the activity log.
  pub async fn record_activity(&self, entry: NewActivity) -> Result<ActivityEntry> {
    let _guard = self.lock().await;
    self.append_activity(entry).await
  }

  /// Prepend to the log and truncate. The caller holds the write lock.
  pub(super) async fn append_activity(&self, entry: NewActivity) -> Result<ActivityEntry> {
    let username = match entry.actor_id {
      None => SYSTEM_ACTOR.to_owned(),
      Some(id) => self
        .user(id)
        .await?
        .map_or_else(|| UNKNOWN_ACTOR.to_owned(), |u| u.username),
    };
    let mut log: Vec<ActivityEntry> = self.load(Collection::ActivityLogs).await?;
    let recorded = ActivityEntry {
      id: next_id(log.iter().map(|e| e.id), 0),
      action: entry.action,
      details: entry.details,
      username,
      created_at: Utc::now(),
      tontine_id: entry.tontine_id,
      target_user_id: entry.target_user_id,
      user_id: entry.actor_id,
    };
    log.insert(0, recorded.clone());
    log.truncate(self.config.activity_retention);
    self.save(Collection::ActivityLogs, &log).await?;
    debug!(id = recorded.id, action = %recorded.action, "activity recorded");
    Ok(recorded)
  }

  /// Up to `limit` entries, newest first. With `owner`, only that user's
  /// own actions.
  ///
  /// An empty unscoped log is seeded with a few example entries, which are
  /// persisted and returned.
  pub async fn activity(&self, limit: usize, owner: Option<u64>) -> Result<Vec<ActivityEntry>> {
    let mut log: Vec<ActivityEntry> = self.load(Collection::ActivityLogs).await?;
    if log.is_empty() && owner.is_none() && self.config.seed_example_activity {
      log = self.seed_example_activity().await?;
    }
    Ok(
      log
        .into_iter()
        .filter(|e| owner.is_none() || e.user_id == owner)
        .take(limit)
        .collect(),
    )
  }

  async fn seed_example_activity(&self) -> Result<Vec<ActivityEntry>> {
    let _guard = self.lock().await;
    let existing: Vec<ActivityEntry> = self.load(Collection::ActivityLogs).await?;
    if !existing.is_empty() {
      return Ok(existing);
    }
    let now = Utc::now();
    let mut seeded: Vec<ActivityEntry> = EXAMPLE_ACTIVITY
      .iter()
      .zip(1u64..)
      .map(|(&(action, details), id)| ActivityEntry {
        id,
        action,
        details: details.to_owned(),
        username: SYSTEM_ACTOR.to_owned(),
        created_at: now,
        tontine_id: None,
        target_user_id: None,
        user_id: None,
      })
      .collect();
    seeded.reverse();
    self.save(Collection::ActivityLogs, &seeded).await?;
    info!(count = seeded.len(), "seeded example activity");
    Ok(seeded)
  }

  // ── Visitors ──────────────────────────────────────────────────────────────

  pub async fn record_visit(&self, visit: NewVisit) -> Result<Visitor> {
    let _guard = self.lock().await;
    let mut visitors: Vec<Visitor> = self.load(Collection::Visitors).await?;
    let visitor = visit.into_visitor(next_id(visitors.iter().map(|v| v.id), 0), Utc::now());
    visitors.insert(0, visitor.clone());
    visitors.truncate(self.config.visitor_retention);
    self.save(Collection::Visitors, &visitors).await?;
    debug!(path = %visitor.path, status = ?visitor.status, "visit recorded");
    Ok(visitor)
  }

  /// Up to `limit` visits, newest first.
  pub async fn visitors(&self, limit: usize) -> Result<Vec<Visitor>> {
    let mut visitors: Vec<Visitor> = self.load(Collection::Visitors).await?;
    visitors.truncate(limit);
    Ok(visitors)
  }

  pub async fn visitor_stats(&self, now: DateTime<Utc>) -> Result<VisitorStats> {
    let visitors: Vec<Visitor> = self.load(Collection::Visitors).await?;
    Ok(VisitorStats::from_visits(&visitors, now))
  }
}
