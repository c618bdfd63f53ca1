//! Handlers for `/tontines` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/tontines` | Own tontines; administrators see all |
//! | `POST`   | `/tontines` | Body: [`NewTontine`]; 409 when over quota |
//! | `GET`    | `/tontines/{id}` | Sets `ETag` |
//! | `PATCH`  | `/tontines/{id}` | Body: [`TontinePatch`]; honours `If-Match` |
//! | `DELETE` | `/tontines/{id}` | 204 |
//! | `GET`    | `/tontines/{id}/schedule` | Month calendar |
//! | `GET`    | `/statistics` | Own figures; administrators get totals |
//! | `GET`    | `/activity` | `?limit=`; own actions unless administrator |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use serde::Deserialize;
use tontine_core::{
  Ledger,
  activity::ActivityEntry,
  report::Statistics,
  store::BlobStore,
  tontine::{MonthSummary, NewTontine, Tontine, TontinePatch},
};

use crate::{
  auth::CurrentUser,
  error::ApiError,
  etag::{compute_etag, if_match},
};

/// Entries returned by listing endpoints when no `limit` is given.
pub const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct LimitParams {
  pub limit: Option<usize>,
}

impl LimitParams {
  pub fn limit(&self) -> usize { self.limit.unwrap_or(DEFAULT_LIMIT) }
}

// ─── List / create ───────────────────────────────────────────────────────────

/// `GET /tontines`
pub async fn list<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
) -> Result<Json<Vec<Tontine>>, ApiError> {
  Ok(Json(ledger.list_tontines(user.scope()).await?))
}

/// `POST /tontines`
pub async fn create<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Json(body): Json<NewTontine>,
) -> Result<impl IntoResponse, ApiError> {
  let tontine = ledger.create_tontine(body, user.id()).await?;
  let etag = compute_etag(&tontine)?;
  Ok((StatusCode::CREATED, [(header::ETAG, etag)], Json(tontine)))
}

// ─── Get / update / delete ───────────────────────────────────────────────────

/// `GET /tontines/{id}`
pub async fn get_one<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let tontine = ledger.get_tontine(&id, user.scope()).await?;
  let etag = compute_etag(&tontine)?;
  Ok(([(header::ETAG, etag)], Json(tontine)))
}

/// `PATCH /tontines/{id}`
pub async fn update<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path(id): Path<String>,
  headers: HeaderMap,
  Json(patch): Json<TontinePatch>,
) -> Result<impl IntoResponse, ApiError> {
  if headers.contains_key(header::IF_MATCH) {
    let current = ledger.get_tontine(&id, Some(user.id())).await?;
    if !if_match(&headers, &compute_etag(&current)?) {
      return Err(ApiError::PreconditionFailed);
    }
  }
  let tontine = ledger.update_tontine(&id, patch, user.id()).await?;
  let etag = compute_etag(&tontine)?;
  Ok(([(header::ETAG, etag)], Json(tontine)))
}

/// `DELETE /tontines/{id}`
pub async fn delete<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
  ledger.delete_tontine(&id, user.id()).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /tontines/{id}/schedule`
pub async fn schedule<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<Vec<MonthSummary>>, ApiError> {
  Ok(Json(ledger.schedule(&id, user.scope()).await?))
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// `GET /statistics`
pub async fn statistics<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
) -> Result<Json<Statistics>, ApiError> {
  Ok(Json(ledger.statistics(user.scope()).await?))
}

/// `GET /activity[?limit=<n>]`
pub async fn activity<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Query(params): Query<LimitParams>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError> {
  Ok(Json(ledger.activity(params.limit(), user.scope()).await?))
}
