//! Handlers for `/tontines/{id}/participants` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use tontine_core::{Ledger, store::BlobStore, tontine::NewParticipant};

use crate::{auth::CurrentUser, error::ApiError};

/// `POST /tontines/{id}/participants`; 409 when the tontine is full.
pub async fn add<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path(id): Path<String>,
  Json(body): Json<NewParticipant>,
) -> Result<impl IntoResponse, ApiError> {
  let participant = ledger.add_participant(&id, body, user.id()).await?;
  Ok((StatusCode::CREATED, Json(participant)))
}

/// `DELETE /tontines/{id}/participants/{pid}`
pub async fn remove<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
  Path((id, pid)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
  ledger.remove_participant(&pid, &id, user.id()).await?;
  Ok(StatusCode::NO_CONTENT)
}
