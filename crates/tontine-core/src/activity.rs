//! Activity-log entries and visitor telemetry records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Entries kept in the activity log and in the visitor log.
pub const DEFAULT_RETENTION: usize = 100;

/// Username recorded for entries with no acting user.
pub const SYSTEM_ACTOR: &str = "system";

/// Username recorded when the acting user id no longer resolves.
pub const UNKNOWN_ACTOR: &str = "unknown user";

// ─── Activity log ────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityAction {
  Login,
  RegistrationRequested,
  UserApproved,
  UserRejected,
  UserStatusChanged,
  UserQuotaChanged,
  TontineCreated,
  TontineUpdated,
  TontineDeleted,
  ParticipantAdded,
  ParticipantRemoved,
  PaymentUpdated,
  BeneficiarySet,
  MonthFinalized,
}

/// One line of the audit trail. Stored newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
  pub id:             u64,
  pub action:         ActivityAction,
  #[serde(default)]
  pub details:        String,
  /// Username of the actor at the time of the action.
  #[serde(default)]
  pub username:       String,
  #[serde(default = "Utc::now")]
  pub created_at:     DateTime<Utc>,
  #[serde(default)]
  pub tontine_id:     Option<String>,
  #[serde(default)]
  pub target_user_id: Option<u64>,
  /// Id of the acting user.
  #[serde(default)]
  pub user_id:        Option<u64>,
}

/// What to log, before an id, timestamp and username are assigned.
#[derive(Debug, Clone)]
pub struct NewActivity {
  pub action:         ActivityAction,
  pub details:        String,
  pub tontine_id:     Option<String>,
  pub actor_id:       Option<u64>,
  pub target_user_id: Option<u64>,
}

impl NewActivity {
  pub fn new(action: ActivityAction, details: impl Into<String>) -> Self {
    Self {
      action,
      details: details.into(),
      tontine_id: None,
      actor_id: None,
      target_user_id: None,
    }
  }

  pub fn tontine(mut self, id: impl Into<String>) -> Self {
    self.tontine_id = Some(id.into());
    self
  }

  pub fn actor(mut self, id: u64) -> Self {
    self.actor_id = Some(id);
    self
  }

  pub fn target(mut self, id: u64) -> Self {
    self.target_user_id = Some(id);
    self
  }
}

// ─── Visitors ────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
  #[default]
  Anonymous,
  Authenticated,
}

/// One recorded request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visitor {
  pub id:         u64,
  #[serde(default = "local")]
  pub ip:         String,
  #[serde(default = "unknown")]
  pub user_agent: String,
  #[serde(default)]
  pub path:       String,
  #[serde(default = "Utc::now")]
  pub visited_at: DateTime<Utc>,
  #[serde(default)]
  pub user_id:    Option<u64>,
  #[serde(default)]
  pub status:     VisitStatus,
}

fn local() -> String { "local".to_owned() }

fn unknown() -> String { "unknown".to_owned() }

/// Input to [`crate::Ledger::record_visit`].
#[derive(Debug, Clone, Default)]
pub struct NewVisit {
  pub ip:         Option<String>,
  pub user_agent: Option<String>,
  pub path:       String,
  pub user_id:    Option<u64>,
}

impl NewVisit {
  pub fn into_visitor(self, id: u64, now: DateTime<Utc>) -> Visitor {
    let status = if self.user_id.is_some() {
      VisitStatus::Authenticated
    } else {
      VisitStatus::Anonymous
    };
    Visitor {
      id,
      ip: self.ip.filter(|s| !s.is_empty()).unwrap_or_else(local),
      user_agent: self.user_agent.filter(|s| !s.is_empty()).unwrap_or_else(unknown),
      path: self.path,
      visited_at: now,
      user_id: self.user_id,
      status,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VisitorStats {
  pub total:         usize,
  /// Visits on the same UTC calendar day as `now`.
  pub today:         usize,
  /// Visits in the seven days up to `now`.
  pub week:          usize,
  pub authenticated: usize,
  pub anonymous:     usize,
}

impl VisitorStats {
  pub fn from_visits(visits: &[Visitor], now: DateTime<Utc>) -> Self {
    let today = now.date_naive();
    let week_start = now - Duration::days(7);
    visits.iter().fold(Self::default(), |mut stats, v| {
      stats.total += 1;
      if v.visited_at.date_naive() == today {
        stats.today += 1;
      }
      if v.visited_at >= week_start {
        stats.week += 1;
      }
      match v.status {
        VisitStatus::Authenticated => stats.authenticated += 1,
        VisitStatus::Anonymous => stats.anonymous += 1,
      }
      stats
    })
  }
}
