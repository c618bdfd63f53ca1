//! Derived views: aggregate statistics and the per-month report.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  account::{User, UserStatus},
  tontine::Tontine,
};

/// Rendered in place of a missing beneficiary name.
pub const NO_BENEFICIARY: &str = "undefined";

// ─── Statistics ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
  pub total_tontines:       usize,
  pub total_participants:   usize,
  /// Sum of `monthly_amount` over the tontines counted.
  pub total_monthly_amount: f64,
  /// Tontines with `start_date ≤ today ≤ end_date`.
  pub active_tontines:      usize,
  // Only present in the unscoped, administrator view.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub total_users:          Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub active_users:         Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pending_requests:     Option<usize>,
}

impl Statistics {
  pub fn for_tontines<'a>(
    tontines: impl IntoIterator<Item = &'a Tontine>,
    today: NaiveDate,
  ) -> Self {
    tontines
      .into_iter()
      .fold(Self::default(), |mut stats, t| {
        stats.total_tontines += 1;
        stats.total_participants += t.participants.len();
        stats.total_monthly_amount += t.monthly_amount;
        if t.is_running(today) {
          stats.active_tontines += 1;
        }
        stats
      })
  }

  /// Add the user-population figures shown to administrators.
  pub fn with_users(mut self, users: &[User], pending_requests: usize) -> Self {
    self.total_users = Some(users.len());
    self.active_users = Some(
      users
        .iter()
        .filter(|u| u.active && u.status == UserStatus::Approved)
        .count(),
    );
    self.pending_requests = Some(pending_requests);
    self
  }
}

// ─── Monthly report ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
  pub participant_id: String,
  pub name:           String,
  pub parts:          u32,
  pub due:            f64,
  pub paid:           bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
  pub tontine_id:       String,
  pub tontine_name:     String,
  pub monthly_amount:   f64,
  pub month:            u32,
  /// Date month `month` falls on; absent past the end of the calendar.
  #[serde(default)]
  pub month_date:       Option<NaiveDate>,
  pub participants:     Vec<ReportLine>,
  pub beneficiary_name: Option<String>,
  pub paid_count:       usize,
  pub total_collected:  f64,
  /// The amount due to the beneficiary if everyone pays.
  pub total_to_collect: f64,
  pub finalized:        bool,
}

impl MonthlyReport {
  pub fn build(tontine: &Tontine, month: u32) -> Self {
    let participants = tontine
      .participants
      .iter()
      .map(|p| ReportLine {
        participant_id: p.id.clone(),
        name:           p.full_name(),
        parts:          p.parts,
        due:            tontine.monthly_due(p),
        paid:           tontine.is_paid(&p.id, month),
      })
      .collect();
    Self {
      tontine_id: tontine.id.clone(),
      tontine_name: tontine.name.clone(),
      monthly_amount: tontine.monthly_amount,
      month,
      month_date: tontine.month_date(month),
      participants,
      beneficiary_name: tontine.beneficiary_name(month),
      paid_count: tontine.paid_count(month),
      total_collected: tontine.collected_amount(month),
      total_to_collect: tontine.total_to_collect(),
      finalized: tontine.finalized_months.contains_key(&month),
    }
  }

  pub fn beneficiary_label(&self) -> &str {
    self.beneficiary_name.as_deref().unwrap_or(NO_BENEFICIARY)
  }
}

impl std::fmt::Display for MonthlyReport {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}, month {}", self.tontine_name, self.month)?;
    match self.month_date {
      Some(date) => writeln!(f, " ({date})")?,
      None => writeln!(f)?,
    }
    writeln!(f, "beneficiary: {}", self.beneficiary_label())?;
    for line in &self.participants {
      let mark = if line.paid { "paid" } else { "unpaid" };
      writeln!(f, "  {:<24} x{} {:>12.2} {mark}", line.name, line.parts, line.due)?;
    }
    write!(
      f,
      "collected {:.2} of {:.2} ({}/{})",
      self.total_collected,
      self.total_to_collect,
      self.paid_count,
      self.participants.len()
    )
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::tontine::{NewTontine, Participant, PaymentStatus};

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  fn tontine(start: NaiveDate, duration: u32, amount: f64) -> Tontine {
    Tontine::create(
      NewTontine {
        name: "Quartier".into(),
        monthly_amount: amount,
        participant_capacity: 5,
        duration_months: duration,
        description: String::new(),
        start_date: start,
      },
      2,
      Utc::now(),
    )
    .unwrap()
  }

  fn enrol(t: &mut Tontine, id: &str, first: &str, parts: u32) {
    t.participants.push(Participant {
      id: id.into(),
      first_name: first.into(),
      last_name: "Traoré".into(),
      parts,
      joined_at: Utc::now(),
    });
    t.participant_order.push(id.into());
  }

  #[test]
  fn statistics_count_running_tontines() {
    let mut a = tontine(d(2024, 1, 1), 6, 10_000.0);
    enrol(&mut a, "p1", "Awa", 1);
    enrol(&mut a, "p2", "Moussa", 1);
    let b = tontine(d(2020, 1, 1), 3, 5_000.0);

    let stats = Statistics::for_tontines([&a, &b], d(2024, 3, 1));
    assert_eq!(stats.total_tontines, 2);
    assert_eq!(stats.total_participants, 2);
    assert_eq!(stats.total_monthly_amount, 15_000.0);
    assert_eq!(stats.active_tontines, 1);
    assert_eq!(stats.total_users, None);

    let json = serde_json::to_value(&stats).unwrap();
    assert!(json.get("total_users").is_none());
  }

  #[test]
  fn report_lists_dues_and_beneficiary() {
    let mut t = tontine(d(2024, 1, 15), 6, 25_000.0);
    enrol(&mut t, "p1", "Awa", 1);
    enrol(&mut t, "p2", "Moussa", 2);
    t.set_payment("p2", 1, PaymentStatus::Paid);

    let report = MonthlyReport::build(&t, 1);
    assert_eq!(report.participants.len(), 2);
    assert_eq!(report.participants[1].due, 50_000.0);
    assert!(report.participants[1].paid);
    assert_eq!(report.paid_count, 1);
    assert_eq!(report.total_collected, 50_000.0);
    assert_eq!(report.total_to_collect, 75_000.0);
    assert_eq!(report.beneficiary_label(), "Awa Traoré");
    assert!(report.to_string().contains("collected 50000.00 of 75000.00 (1/2)"));
  }

  #[test]
  fn missing_beneficiary_renders_undefined() {
    let mut t = tontine(d(2024, 1, 15), 6, 1_000.0);
    enrol(&mut t, "p1", "Awa", 1);
    let report = MonthlyReport::build(&t, 4);
    assert_eq!(report.beneficiary_name, None);
    assert_eq!(report.beneficiary_label(), "undefined");
  }
}
