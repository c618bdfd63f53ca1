//! Payment flags, beneficiaries and month finalisation.

use chrono::Utc;
use tracing::{debug, info, warn};

use super::{Ledger, check_month, find_tontine, find_tontine_mut};
use crate::{
  Error, Result,
  activity::{ActivityAction, NewActivity},
  store::{BlobStore, Collection},
  tontine::{FinalizedMonth, PaymentStatus, ResolvedBeneficiary},
};

impl<S: BlobStore> Ledger<S> {
  /// Record whether `participant_id` paid for `month`. Logged on every call,
  /// even when the flag does not change.
  pub async fn set_payment_status(
    &self,
    tontine_id: &str,
    participant_id: &str,
    month: u32,
    status: PaymentStatus,
    owner_id: u64,
  ) -> Result<()> {
    let _guard = self.lock().await;
    let mut tontines = self.load_tontines().await?;
    let tontine = find_tontine_mut(&mut tontines, tontine_id, owner_id)?;
    check_month(tontine, month)?;
    let name = tontine
      .participant(participant_id)
      .map(|p| p.full_name())
      .ok_or_else(|| Error::NotFound(format!("participant {participant_id}")))?;
    tontine.set_payment(participant_id, month, status);

    self.save(Collection::Tontines, &tontines).await?;
    let verb = if status.is_paid() { "paid" } else { "unpaid" };
    self
      .append_activity(
        NewActivity::new(
          ActivityAction::PaymentUpdated,
          format!("{name} marked {verb} for month {month}"),
        )
        .tontine(tontine_id)
        .actor(owner_id),
      )
      .await?;
    info!(tontine_id, participant_id, month, ?status, "payment updated");
    Ok(())
  }

  /// Unpaid unless a payment was recorded.
  pub async fn get_payment_status(
    &self,
    tontine_id: &str,
    participant_id: &str,
    month: u32,
    owner: Option<u64>,
  ) -> Result<PaymentStatus> {
    let tontines = self.load_tontines().await?;
    let tontine = find_tontine(&tontines, tontine_id, owner)?;
    Ok(tontine.payment_status(participant_id, month))
  }

  /// Set every current participant's flag for `month` at once. Returns how
  /// many participants were touched.
  pub async fn set_month_payments(
    &self,
    tontine_id: &str,
    month: u32,
    status: PaymentStatus,
    owner_id: u64,
  ) -> Result<usize> {
    let _guard = self.lock().await;
    let mut tontines = self.load_tontines().await?;
    let tontine = find_tontine_mut(&mut tontines, tontine_id, owner_id)?;
    check_month(tontine, month)?;
    let ids: Vec<String> = tontine.participants.iter().map(|p| p.id.clone()).collect();
    for id in &ids {
      tontine.set_payment(id, month, status);
    }

    self.save(Collection::Tontines, &tontines).await?;
    let verb = if status.is_paid() { "paid" } else { "unpaid" };
    self
      .append_activity(
        NewActivity::new(
          ActivityAction::PaymentUpdated,
          format!("all {} participants marked {verb} for month {month}", ids.len()),
        )
        .tontine(tontine_id)
        .actor(owner_id),
      )
      .await?;
    info!(tontine_id, month, ?status, count = ids.len(), "month payments updated");
    Ok(ids.len())
  }

  // ── Beneficiaries ─────────────────────────────────────────────────────────

  /// Designate `participant_id` as the beneficiary of `month`. The last
  /// designation wins.
  pub async fn set_beneficiary(
    &self,
    tontine_id: &str,
    participant_id: &str,
    month: u32,
    owner_id: u64,
  ) -> Result<()> {
    let _guard = self.lock().await;
    let mut tontines = self.load_tontines().await?;
    let tontine = find_tontine_mut(&mut tontines, tontine_id, owner_id)?;
    check_month(tontine, month)?;
    let name = tontine
      .participant(participant_id)
      .map(|p| p.full_name())
      .ok_or_else(|| Error::NotFound(format!("participant {participant_id}")))?;
    tontine
      .beneficiaries
      .insert(month, participant_id.to_owned());

    self.save(Collection::Tontines, &tontines).await?;
    self
      .append_activity(
        NewActivity::new(
          ActivityAction::BeneficiarySet,
          format!("{name} is the beneficiary of month {month}"),
        )
        .tontine(tontine_id)
        .actor(owner_id),
      )
      .await?;
    info!(tontine_id, participant_id, month, "beneficiary set");
    Ok(())
  }

  /// The explicit beneficiary of `month`, else the rotation default.
  pub async fn get_beneficiary(
    &self,
    tontine_id: &str,
    month: u32,
    owner: Option<u64>,
  ) -> Result<Option<ResolvedBeneficiary>> {
    let tontines = self.load_tontines().await?;
    let resolved = find_tontine(&tontines, tontine_id, owner)?.beneficiary(month);
    debug!(tontine_id, month, ?resolved, "resolved beneficiary");
    Ok(resolved)
  }

  /// Close `month`: record who received the pot and how much was collected.
  pub async fn finalize_month(
    &self,
    tontine_id: &str,
    month: u32,
    owner_id: u64,
  ) -> Result<FinalizedMonth> {
    let _guard = self.lock().await;
    let mut tontines = self.load_tontines().await?;
    let tontine = find_tontine_mut(&mut tontines, tontine_id, owner_id)?;
    check_month(tontine, month)?;
    if tontine.finalized_months.contains_key(&month) {
      return Err(Error::Conflict(format!("month {month} is already finalized")));
    }
    let Some(beneficiary) = tontine.beneficiary(month) else {
      warn!(tontine_id, month, "no beneficiary to finalize");
      return Err(Error::Validation(format!("month {month} has no beneficiary")));
    };
    let finalized = FinalizedMonth {
      beneficiary_id: beneficiary.participant_id,
      amount:         tontine.collected_amount(month),
      finalized_at:   Utc::now(),
    };
    tontine.finalized_months.insert(month, finalized.clone());
    let name = tontine
      .beneficiary_name(month)
      .unwrap_or_else(|| finalized.beneficiary_id.clone());

    self.save(Collection::Tontines, &tontines).await?;
    self
      .append_activity(
        NewActivity::new(
          ActivityAction::MonthFinalized,
          format!("month {month} closed: {:.2} to {name}", finalized.amount),
        )
        .tontine(tontine_id)
        .actor(owner_id),
      )
      .await?;
    info!(tontine_id, month, amount = finalized.amount, "month finalized");
    Ok(finalized)
  }
}
