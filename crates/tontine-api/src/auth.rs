//! HTTP Basic authentication and visitor telemetry.
//!
//! [`identify`] runs in front of every route. It resolves the Basic
//! credentials once, stores the signed-in user in the request extensions and
//! records the visit. Handlers that need a user take a [`CurrentUser`].

use std::sync::Arc;

use axum::{
  extract::{FromRequestParts, Request, State},
  http::{HeaderMap, header, request::Parts},
  middleware::Next,
  response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use tontine_core::{Ledger, account::User, activity::NewVisit, store::BlobStore};
use tracing::warn;

use crate::error::ApiError;

/// The signed-in user of a request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
  pub fn id(&self) -> u64 { self.0.id }

  /// Owner filter for reads: administrators see everything.
  pub fn scope(&self) -> Option<u64> {
    if self.0.is_admin() { None } else { Some(self.0.id) }
  }

  pub fn require_admin(&self) -> Result<(), ApiError> {
    if self.0.is_admin() {
      Ok(())
    } else {
      Err(ApiError::Forbidden("administrator role required".into()))
    }
  }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<CurrentUser>()
      .cloned()
      .ok_or(ApiError::Unauthorized)
  }
}

/// Decode `Authorization: Basic …` into `(username, password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let encoded = value.strip_prefix("Basic ")?;
  let decoded = B64.decode(encoded.trim()).ok()?;
  let creds = String::from_utf8(decoded).ok()?;
  let (username, password) = creds.split_once(':')?;
  Some((username.to_owned(), password.to_owned()))
}

/// First address of `X-Forwarded-For`, if any.
fn client_ip(headers: &HeaderMap) -> Option<String> {
  let forwarded = headers.get("x-forwarded-for")?.to_str().ok()?;
  forwarded
    .split(',')
    .map(str::trim)
    .find(|s| !s.is_empty())
    .map(str::to_owned)
}

/// Middleware: resolve credentials, then record the visit.
///
/// Bad credentials are not rejected here; routes that need a user reject
/// through the [`CurrentUser`] extractor. A failed visit write is logged and
/// otherwise ignored.
pub async fn identify<S>(
  State(ledger): State<Arc<Ledger<S>>>,
  mut req: Request,
  next: Next,
) -> Result<Response, ApiError>
where
  S: BlobStore + 'static,
{
  let user = match basic_credentials(req.headers()) {
    Some((username, password)) => ledger.verify(&username, &password).await?,
    None => None,
  };

  let visit = NewVisit {
    ip:         client_ip(req.headers()),
    user_agent: req
      .headers()
      .get(header::USER_AGENT)
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned),
    path:       req.uri().path().to_owned(),
    user_id:    user.as_ref().map(|u| u.id),
  };
  if let Err(e) = ledger.record_visit(visit).await {
    warn!(error = %e, "failed to record visit");
  }

  if let Some(user) = user {
    req.extensions_mut().insert(CurrentUser(user));
  }
  Ok(next.run(req).await)
}
