//! Handlers for `/tontines/{id}/months/{m}/…` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `…/payments/{pid}` | Unpaid when never recorded |
//! | `PUT`  | `…/payments/{pid}` | Body: `{"status":"paid"}` |
//! | `PUT`  | `…/payments` | Same body, applied to every participant |
//! | `GET`  | `…/beneficiary` | Explicit choice or rotation default; `null` if none |
//! | `PUT`  | `…/beneficiary` | Body: `{"participant_id":"…"}` |
//! | `POST` | `…/finalize` | 409 if already finalized |
//! | `GET`  | `…/report` | `?format=text` for a plain-text rendering |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tontine_core::{
  Ledger,
  store::BlobStore,
  tontine::{PaymentStatus, ResolvedBeneficiary},
};

use crate::{auth::CurrentUser, error::ApiError};

// ─── Payments ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PaymentBody {
  pub status: PaymentStatus,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
  pub participant_id: String,
  pub month:          u32,
  pub status:         PaymentStatus,
}

/// `GET /tontines/{id}/months/{m}/payments/{pid}`
pub async fn get_payment<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path((id, month, pid)): Path<(String, u32, String)>,
) -> Result<Json<PaymentResponse>, ApiError> {
  let status = ledger
    .get_payment_status(&id, &pid, month, user.scope())
    .await?;
  Ok(Json(PaymentResponse { participant_id: pid, month, status }))
}

/// `PUT /tontines/{id}/months/{m}/payments/{pid}`
pub async fn set_payment<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path((id, month, pid)): Path<(String, u32, String)>,
  Json(body): Json<PaymentBody>,
) -> Result<Json<PaymentResponse>, ApiError> {
  ledger
    .set_payment_status(&id, &pid, month, body.status, user.id())
    .await?;
  Ok(Json(PaymentResponse { participant_id: pid, month, status: body.status }))
}

#[derive(Debug, Serialize)]
pub struct BulkResponse {
  pub month:   u32,
  pub status:  PaymentStatus,
  pub updated: usize,
}

/// `PUT /tontines/{id}/months/{m}/payments`
pub async fn set_month<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path((id, month)): Path<(String, u32)>,
  Json(body): Json<PaymentBody>,
) -> Result<Json<BulkResponse>, ApiError> {
  let updated = ledger
    .set_month_payments(&id, month, body.status, user.id())
    .await?;
  Ok(Json(BulkResponse { month, status: body.status, updated }))
}

// ─── Beneficiary ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BeneficiaryBody {
  pub participant_id: String,
}

/// `GET /tontines/{id}/months/{m}/beneficiary`
pub async fn get_beneficiary<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path((id, month)): Path<(String, u32)>,
) -> Result<Json<Option<ResolvedBeneficiary>>, ApiError> {
  Ok(Json(ledger.get_beneficiary(&id, month, user.scope()).await?))
}

/// `PUT /tontines/{id}/months/{m}/beneficiary`
pub async fn set_beneficiary<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path((id, month)): Path<(String, u32)>,
  Json(body): Json<BeneficiaryBody>,
) -> Result<StatusCode, ApiError> {
  ledger
    .set_beneficiary(&id, &body.participant_id, month, user.id())
    .await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /tontines/{id}/months/{m}/finalize`
pub async fn finalize<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path((id, month)): Path<(String, u32)>,
) -> Result<impl IntoResponse, ApiError> {
  let finalized = ledger.finalize_month(&id, month, user.id()).await?;
  Ok((StatusCode::CREATED, Json(finalized)))
}

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
  #[default]
  Json,
  Text,
}

#[derive(Debug, Deserialize)]
pub struct ReportParams {
  #[serde(default)]
  pub format: ReportFormat,
}

/// `GET /tontines/{id}/months/{m}/report[?format=text]`
pub async fn report<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path((id, month)): Path<(String, u32)>,
  Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
  let report = ledger
    .monthly_report(&id, month, user.scope())
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("tontine {id}")))?;
  Ok(match params.format {
    ReportFormat::Json => Json(report).into_response(),
    ReportFormat::Text => report.to_string().into_response(),
  })
}
