//! Calendar arithmetic for contribution months.
//!
//! Month *k* (1-indexed) of a tontine falls on `start_date + (k - 1)` calendar
//! months. Month addition clamps the day of month, so 31 January plus one
//! month is the last day of February.

use chrono::{Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Longest schedule accepted, in months.
pub const MAX_DURATION_MONTHS: u32 = 1200;

/// Today's date in UTC.
pub fn today() -> NaiveDate { Utc::now().date_naive() }

/// Add `months` calendar months to `date`, clamping the day of month.
/// `None` past the end of the calendar.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
  date.checked_add_months(Months::new(months))
}

/// The date of month `number` (1-indexed) of a schedule starting on `start`.
/// Month 0 is treated as month 1.
pub fn month_date(start: NaiveDate, number: u32) -> Option<NaiveDate> {
  add_months(start, number.saturating_sub(1))
}

/// The last day covered by a schedule of `duration` months.
pub fn end_date(start: NaiveDate, duration: u32) -> Option<NaiveDate> {
  add_months(start, duration)
}

/// Check a schedule of `duration` months from `start` and return its end
/// date.
pub fn span(start: NaiveDate, duration: u32) -> Result<NaiveDate> {
  if duration > MAX_DURATION_MONTHS {
    return Err(Error::Validation(format!(
      "duration of {duration} months exceeds {MAX_DURATION_MONTHS}"
    )));
  }
  end_date(start, duration).ok_or_else(|| {
    Error::Validation(format!("{duration} months from {start} is out of range"))
  })
}

// ─── Month status ────────────────────────────────────────────────────────────

/// Where a contribution month sits relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthStatus {
  Future,
  Current,
  Completed,
}

/// Classify the month whose date is `month_date`.
///
/// A date later than today is `Future` even when it falls in the current
/// calendar month.
pub fn month_status(month_date: NaiveDate, today: NaiveDate) -> MonthStatus {
  if month_date > today {
    MonthStatus::Future
  } else if month_date.year() == today.year() && month_date.month() == today.month() {
    MonthStatus::Current
  } else {
    MonthStatus::Completed
  }
}

/// The month number `today` falls in, clamped to `1..=duration`. Zero when
/// the schedule is empty.
pub fn current_month_number(start: NaiveDate, duration: u32, today: NaiveDate) -> u32 {
  if duration == 0 {
    return 0;
  }
  let elapsed = (i64::from(today.year()) - i64::from(start.year())) * 12
    + i64::from(today.month())
    - i64::from(start.month())
    + 1;
  // Clamped into `1..=duration`, so the narrowing is lossless.
  elapsed.clamp(1, i64::from(duration)) as u32
}

/// How far through its schedule a tontine is, in whole percent.
pub fn progress_percentage(start: NaiveDate, duration: u32, today: NaiveDate) -> u8 {
  if duration == 0 {
    return 0;
  }
  let current = current_month_number(start, duration, today);
  let pct = (f64::from(current) / f64::from(duration) * 100.0).round();
  pct.clamp(0.0, 100.0) as u8
}

// ─── Tontine phase ───────────────────────────────────────────────────────────

/// The overall state of a tontine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TontinePhase {
  /// No participants enrolled yet.
  Pending,
  Upcoming,
  Active,
  Finished,
}

/// Whether `today` lies within `start..=end`.
pub fn is_running(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> bool {
  start <= today && today <= end
}
