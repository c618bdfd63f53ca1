//! Read-only aggregate views.

use tracing::debug;

use super::{Ledger, check_month, check_owner, find_tontine};
use crate::{
  Result,
  account::RegistrationRequest,
  report::{MonthlyReport, Statistics},
  schedule,
  store::{BlobStore, Collection},
  tontine::MonthSummary,
};

impl<S: BlobStore> Ledger<S> {
  /// Figures over `owner`'s tontines, or over everything (with user counts)
  /// when unscoped.
  pub async fn statistics(&self, owner: Option<u64>) -> Result<Statistics> {
    let tontines = self.list_tontines(owner).await?;
    let stats = Statistics::for_tontines(&tontines, schedule::today());
    if owner.is_some() {
      return Ok(stats);
    }
    let users = self.load_users().await?;
    let requests: Vec<RegistrationRequest> =
      self.load(Collection::RegistrationRequests).await?;
    let pending = requests.iter().filter(|r| r.is_pending()).count();
    Ok(stats.with_users(&users, pending))
  }

  /// The report for `month`, or `None` when the tontine does not exist or
  /// is not visible to `owner`. Months outside the schedule are refused.
  pub async fn monthly_report(
    &self,
    tontine_id: &str,
    month: u32,
    owner: Option<u64>,
  ) -> Result<Option<MonthlyReport>> {
    let tontines = self.load_tontines().await?;
    let Some(tontine) = tontines.iter().find(|t| t.id == tontine_id) else {
      return Ok(None);
    };
    if check_owner(tontine, owner).is_err() {
      debug!(tontine_id, ?owner, "report hidden from non-owner");
      return Ok(None);
    }
    check_month(tontine, month)?;
    Ok(Some(MonthlyReport::build(tontine, month)))
  }

  /// The month calendar of a tontine as of today.
  pub async fn schedule(&self, tontine_id: &str, owner: Option<u64>) -> Result<Vec<MonthSummary>> {
    let tontines = self.load_tontines().await?;
    Ok(find_tontine(&tontines, tontine_id, owner)?.schedule(schedule::today()))
  }
}
