//! Handlers for `/admin` endpoints. Every route needs an administrator.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tontine_core::{
  Ledger,
  activity::{Visitor, VisitorStats},
  store::BlobStore,
};

use crate::{
  auth::CurrentUser,
  error::ApiError,
  handlers::{
    account::{RegistrationResponse, UserResponse},
    tontines::LimitParams,
  },
};

/// Quota granted on approval when the body names none.
pub const DEFAULT_APPROVAL_QUOTA: u32 = 5;

// ─── Users ───────────────────────────────────────────────────────────────────

/// `GET /admin/users`
pub async fn users<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
  let users = ledger.users(user.id()).await?;
  Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[derive(Debug, Serialize)]
pub struct ActiveResponse {
  pub active: bool,
}

/// `POST /admin/users/{id}/toggle-active`
pub async fn toggle_active<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path(id): Path<u64>,
) -> Result<Json<ActiveResponse>, ApiError> {
  let active = ledger.toggle_active(id, user.id()).await?;
  Ok(Json(ActiveResponse { active }))
}

#[derive(Debug, Deserialize)]
pub struct QuotaBody {
  pub quota: u32,
}

/// `PUT /admin/users/{id}/quota`
pub async fn set_quota<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path(id): Path<u64>,
  Json(body): Json<QuotaBody>,
) -> Result<Json<UserResponse>, ApiError> {
  let updated = ledger.set_quota(id, body.quota, user.id()).await?;
  Ok(Json(updated.into()))
}

// ─── Registrations ───────────────────────────────────────────────────────────

/// `GET /admin/registrations`
pub async fn registrations<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
) -> Result<Json<Vec<RegistrationResponse>>, ApiError> {
  let requests = ledger.registrations(user.id()).await?;
  Ok(Json(requests.into_iter().map(RegistrationResponse::from).collect()))
}

#[derive(Debug, Default, Deserialize)]
pub struct ApproveBody {
  pub quota: Option<u32>,
}

/// `POST /admin/registrations/{id}/approve`; body optional.
pub async fn approve<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path(id): Path<u64>,
  body: Option<Json<ApproveBody>>,
) -> Result<Json<UserResponse>, ApiError> {
  let quota = body
    .and_then(|Json(b)| b.quota)
    .unwrap_or(DEFAULT_APPROVAL_QUOTA);
  let created = ledger.approve(id, user.id(), quota).await?;
  Ok(Json(created.into()))
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectBody {
  pub reason: Option<String>,
}

/// `POST /admin/registrations/{id}/reject`; body optional.
pub async fn reject<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path(id): Path<u64>,
  body: Option<Json<RejectBody>>,
) -> Result<Json<RegistrationResponse>, ApiError> {
  let reason = body.and_then(|Json(b)| b.reason);
  let rejected = ledger.reject(id, user.id(), reason).await?;
  Ok(Json(rejected.into()))
}

// ─── Visitors ────────────────────────────────────────────────────────────────

/// `GET /admin/visitors[?limit=<n>]`
pub async fn visitors<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Query(params): Query<LimitParams>,
) -> Result<Json<Vec<Visitor>>, ApiError> {
  user.require_admin()?;
  Ok(Json(ledger.visitors(params.limit()).await?))
}

/// `GET /admin/visitors/stats`
pub async fn visitor_stats<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
) -> Result<Json<VisitorStats>, ApiError> {
  user.require_admin()?;
  Ok(Json(ledger.visitor_stats(Utc::now()).await?))
}
