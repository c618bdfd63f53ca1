//! Tontines, their participants, and the per-month ledger derived from them.
//!
//! A tontine owns its participants, the paid/unpaid flag of every
//! (participant, month) pair, the rotation order and any explicit beneficiary
//! overrides. Amounts, ratios and the month calendar are computed on read.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result, lenient,
  schedule::{self, MAX_DURATION_MONTHS, MonthStatus, TontinePhase},
};

/// Name given to tontines stored without one.
pub const UNTITLED: &str = "Untitled tontine";

fn untitled() -> String { UNTITLED.to_owned() }

fn one() -> u32 { 1 }

// ─── Participant ─────────────────────────────────────────────────────────────

/// A member of one tontine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
  pub id:         String,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub last_name:  String,
  /// Number of shares held. A participant pays `parts × monthly_amount`.
  #[serde(default = "one", deserialize_with = "lenient::count")]
  pub parts:      u32,
  #[serde(default = "Utc::now")]
  pub joined_at:  DateTime<Utc>,
}

impl Participant {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name).trim().to_owned()
  }
}

/// Input to [`crate::Ledger::add_participant`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewParticipant {
  pub first_name: String,
  #[serde(default)]
  pub last_name:  String,
  #[serde(default = "one", deserialize_with = "lenient::count")]
  pub parts:      u32,
}

// ─── Payments and beneficiaries ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
  Paid,
  #[default]
  Unpaid,
}

impl PaymentStatus {
  pub fn is_paid(self) -> bool { self == Self::Paid }
}

impl From<bool> for PaymentStatus {
  fn from(paid: bool) -> Self { if paid { Self::Paid } else { Self::Unpaid } }
}

/// Key of a (participant, month) entry in [`Tontine::payments`].
pub fn payment_key(participant_id: &str, month: u32) -> String {
  format!("{participant_id}-{month}")
}

/// Where a month's beneficiary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeneficiarySource {
  /// Set explicitly for that month.
  Explicit,
  /// Taken from `participant_order[month - 1]`.
  Rotation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedBeneficiary {
  pub participant_id: String,
  pub source:         BeneficiarySource,
}

/// A month whose pot has been handed over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedMonth {
  pub beneficiary_id: String,
  pub amount:         f64,
  pub finalized_at:   DateTime<Utc>,
}

/// Paid participants over all participants for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRatio {
  pub paid:       usize,
  pub total:      usize,
  /// Rounded; zero when there are no participants.
  pub percentage: u8,
}

impl std::fmt::Display for PaymentRatio {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}/{}", self.paid, self.total)
  }
}

// ─── Tontine ─────────────────────────────────────────────────────────────────

/// A rotating savings group. Stored in the `tontines` collection.
///
/// Every field has a serde default so that records written before a field
/// existed still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tontine {
  pub id:                   String,
  #[serde(default)]
  pub owner_id:             u64,
  #[serde(default = "untitled")]
  pub name:                 String,
  #[serde(default, deserialize_with = "lenient::amount")]
  pub monthly_amount:       f64,
  /// Target number of participants.
  #[serde(default, deserialize_with = "lenient::count")]
  pub participant_capacity: u32,
  #[serde(default, deserialize_with = "lenient::count")]
  pub duration_months:      u32,
  #[serde(default)]
  pub description:          String,
  #[serde(default = "schedule::today")]
  pub start_date:           NaiveDate,
  /// Always `start_date + duration_months`.
  #[serde(default = "schedule::today")]
  pub end_date:             NaiveDate,
  #[serde(default = "Utc::now")]
  pub created_at:           DateTime<Utc>,
  #[serde(default)]
  pub participants:         Vec<Participant>,
  /// `"<participant_id>-<month>"` → paid.
  #[serde(default)]
  pub payments:             BTreeMap<String, bool>,
  /// Default beneficiary rotation: entry `k - 1` benefits in month `k`.
  #[serde(default)]
  pub participant_order:    Vec<String>,
  /// Explicit beneficiary per month, overriding the rotation.
  #[serde(default)]
  pub beneficiaries:        BTreeMap<u32, String>,
  #[serde(default)]
  pub finalized_months:     BTreeMap<u32, FinalizedMonth>,
}

/// Input to [`crate::Ledger::create_tontine`]. `end_date` is derived, never
/// accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTontine {
  #[serde(default)]
  pub name:                 String,
  #[serde(default, deserialize_with = "lenient::amount")]
  pub monthly_amount:       f64,
  #[serde(default, deserialize_with = "lenient::count")]
  pub participant_capacity: u32,
  #[serde(default, deserialize_with = "lenient::count")]
  pub duration_months:      u32,
  #[serde(default)]
  pub description:          String,
  #[serde(default = "schedule::today")]
  pub start_date:           NaiveDate,
}

/// A shallow partial update; `None` fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TontinePatch {
  #[serde(default)]
  pub name:                 Option<String>,
  #[serde(default, deserialize_with = "lenient::opt_amount")]
  pub monthly_amount:       Option<f64>,
  #[serde(default, deserialize_with = "lenient::opt_count")]
  pub participant_capacity: Option<u32>,
  #[serde(default, deserialize_with = "lenient::opt_count")]
  pub duration_months:      Option<u32>,
  #[serde(default)]
  pub description:          Option<String>,
  #[serde(default)]
  pub start_date:           Option<NaiveDate>,
}

impl Tontine {
  /// Build a fresh, empty tontine owned by `owner_id`. Fails with
  /// `Validation` when the schedule does not fit the calendar.
  pub fn create(input: NewTontine, owner_id: u64, now: DateTime<Utc>) -> Result<Self> {
    let end_date = schedule::span(input.start_date, input.duration_months)?;
    let name = if input.name.trim().is_empty() {
      "New tontine".to_owned()
    } else {
      input.name.trim().to_owned()
    };
    Ok(Self {
      id: Uuid::new_v4().to_string(),
      owner_id,
      name,
      monthly_amount: input.monthly_amount,
      participant_capacity: input.participant_capacity,
      duration_months: input.duration_months,
      description: input.description,
      start_date: input.start_date,
      end_date,
      created_at: now,
      participants: Vec::new(),
      payments: BTreeMap::new(),
      participant_order: Vec::new(),
      beneficiaries: BTreeMap::new(),
      finalized_months: BTreeMap::new(),
    })
  }

  /// Repair shapes that serde defaults cannot express.
  pub fn normalize(&mut self) {
    if self.name.trim().is_empty() {
      self.name = untitled();
    }
    for p in &mut self.participants {
      p.parts = p.parts.max(1);
    }
  }

  /// Merge `patch` in and re-derive `end_date`. A patch whose schedule does
  /// not fit the calendar is refused before anything changes.
  pub fn apply(&mut self, patch: TontinePatch) -> Result<()> {
    let end_date = schedule::span(
      patch.start_date.unwrap_or(self.start_date),
      patch.duration_months.unwrap_or(self.duration_months),
    )?;
    if let Some(name) = patch.name {
      self.name = name;
    }
    if let Some(amount) = patch.monthly_amount {
      self.monthly_amount = amount;
    }
    if let Some(capacity) = patch.participant_capacity {
      self.participant_capacity = capacity;
    }
    if let Some(duration) = patch.duration_months {
      self.duration_months = duration;
    }
    if let Some(description) = patch.description {
      self.description = description;
    }
    if let Some(start) = patch.start_date {
      self.start_date = start;
    }
    self.normalize();
    self.end_date = end_date;
    Ok(())
  }

  // ── Participants ──────────────────────────────────────────────────────────

  pub fn participant(&self, id: &str) -> Option<&Participant> {
    self.participants.iter().find(|p| p.id == id)
  }

  pub fn is_full(&self) -> bool {
    self.participants.len() >= self.participant_capacity as usize
  }

  /// Month in which `participant_id` benefits under the default rotation.
  pub fn rotation_month(&self, participant_id: &str) -> Option<u32> {
    self
      .participant_order
      .iter()
      .position(|id| id == participant_id)
      .and_then(|i| u32::try_from(i + 1).ok())
  }

  /// Remove a participant and every payment flag and beneficiary slot that
  /// points at them. Returns the removed participant.
  pub fn remove_participant(&mut self, participant_id: &str) -> Option<Participant> {
    let index = self.participants.iter().position(|p| p.id == participant_id)?;
    let removed = self.participants.remove(index);
    self.participant_order.retain(|id| id != participant_id);
    self.payments.retain(|key, _| {
      key
        .rsplit_once('-')
        .is_none_or(|(owner, _)| owner != participant_id)
    });
    self.beneficiaries.retain(|_, id| id != participant_id);
    Some(removed)
  }

  // ── Payments ──────────────────────────────────────────────────────────────

  pub fn is_paid(&self, participant_id: &str, month: u32) -> bool {
    self
      .payments
      .get(&payment_key(participant_id, month))
      .copied()
      .unwrap_or(false)
  }

  pub fn payment_status(&self, participant_id: &str, month: u32) -> PaymentStatus {
    self.is_paid(participant_id, month).into()
  }

  pub fn set_payment(&mut self, participant_id: &str, month: u32, status: PaymentStatus) {
    self
      .payments
      .insert(payment_key(participant_id, month), status.is_paid());
  }

  /// What `participant` owes each month.
  pub fn monthly_due(&self, participant: &Participant) -> f64 {
    self.monthly_amount * f64::from(participant.parts)
  }

  /// Sum of every participant's monthly due: the full pot of one month.
  pub fn total_to_collect(&self) -> f64 {
    self.participants.iter().map(|p| self.monthly_due(p)).sum()
  }

  /// Sum of the dues of participants marked paid for `month`.
  pub fn collected_amount(&self, month: u32) -> f64 {
    self
      .participants
      .iter()
      .filter(|p| self.is_paid(&p.id, month))
      .map(|p| self.monthly_due(p))
      .sum()
  }

  pub fn paid_count(&self, month: u32) -> usize {
    self
      .participants
      .iter()
      .filter(|p| self.is_paid(&p.id, month))
      .count()
  }

  pub fn payment_ratio(&self, month: u32) -> PaymentRatio {
    let paid = self.paid_count(month);
    let total = self.participants.len();
    let percentage = if total == 0 {
      0
    } else {
      (paid as f64 / total as f64 * 100.0).round() as u8
    };
    PaymentRatio { paid, total, percentage }
  }

  // ── Beneficiaries ─────────────────────────────────────────────────────────

  /// The beneficiary of `month`: the explicit choice if one was made,
  /// otherwise the participant at that position of the rotation order.
  pub fn beneficiary(&self, month: u32) -> Option<ResolvedBeneficiary> {
    if let Some(id) = self.beneficiaries.get(&month) {
      return Some(ResolvedBeneficiary {
        participant_id: id.clone(),
        source:         BeneficiarySource::Explicit,
      });
    }
    let index = usize::try_from(month.checked_sub(1)?).ok()?;
    self
      .participant_order
      .get(index)
      .map(|id| ResolvedBeneficiary {
        participant_id: id.clone(),
        source:         BeneficiarySource::Rotation,
      })
  }

  /// Full name of the resolved beneficiary of `month`, if they are still
  /// enrolled.
  pub fn beneficiary_name(&self, month: u32) -> Option<String> {
    let resolved = self.beneficiary(month)?;
    self
      .participant(&resolved.participant_id)
      .map(Participant::full_name)
  }

  // ── Schedule ──────────────────────────────────────────────────────────────

  pub fn contains_month(&self, month: u32) -> bool {
    (1..=self.duration_months).contains(&month)
  }

  /// `None` only for stored schedules that run past the calendar.
  pub fn month_date(&self, month: u32) -> Option<NaiveDate> {
    schedule::month_date(self.start_date, month)
  }

  pub fn month_status(&self, month: u32, today: NaiveDate) -> Option<MonthStatus> {
    self.month_date(month).map(|date| schedule::month_status(date, today))
  }

  pub fn current_month_number(&self, today: NaiveDate) -> u32 {
    schedule::current_month_number(self.start_date, self.duration_months, today)
  }

  pub fn progress_percentage(&self, today: NaiveDate) -> u8 {
    schedule::progress_percentage(self.start_date, self.duration_months, today)
  }

  /// Running on `today`, i.e. `start_date ≤ today ≤ end_date`.
  pub fn is_running(&self, today: NaiveDate) -> bool {
    schedule::is_running(self.start_date, self.end_date, today)
  }

  pub fn phase(&self, today: NaiveDate) -> TontinePhase {
    if self.participants.is_empty() {
      TontinePhase::Pending
    } else if today < self.start_date {
      TontinePhase::Upcoming
    } else if today > self.end_date {
      TontinePhase::Finished
    } else {
      TontinePhase::Active
    }
  }

  /// One summary per contribution month, in order. Stops at
  /// [`MAX_DURATION_MONTHS`] or at the end of the calendar.
  pub fn schedule(&self, today: NaiveDate) -> Vec<MonthSummary> {
    (1..=self.duration_months.min(MAX_DURATION_MONTHS))
      .map_while(|number| {
        let date = self.month_date(number)?;
        let ratio = self.payment_ratio(number);
        Some(MonthSummary {
          number,
          date,
          status: schedule::month_status(date, today),
          ratio: ratio.to_string(),
          paid_count: ratio.paid,
          participant_count: ratio.total,
          percentage: ratio.percentage,
          collected_amount: self.collected_amount(number),
          beneficiary: self.beneficiary(number),
          beneficiary_name: self.beneficiary_name(number),
          finalized: self.finalized_months.contains_key(&number),
        })
      })
      .collect()
  }
}

/// One row of the month calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthSummary {
  pub number:            u32,
  pub date:              NaiveDate,
  pub status:            MonthStatus,
  /// `"paid/total"`.
  pub ratio:             String,
  pub paid_count:        usize,
  pub participant_count: usize,
  pub percentage:        u8,
  pub collected_amount:  f64,
  pub beneficiary:       Option<ResolvedBeneficiary>,
  pub beneficiary_name:  Option<String>,
  pub finalized:         bool,
}
