//! Handlers for sign-in and self-service registration.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/login` | Basic credentials; logs the sign-in |
//! | `POST` | `/register` | No credentials. Body: [`NewRegistration`] |

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tontine_core::{
  Ledger,
  account::{NewRegistration, RegistrationRequest, RequestStatus, Role, User, UserStatus},
  store::BlobStore,
};

use crate::{auth::CurrentUser, error::ApiError};

// ─── Response bodies ─────────────────────────────────────────────────────────

/// A [`User`] as shown to API callers, without the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
  pub id:               u64,
  pub username:         String,
  pub email:            String,
  pub first_name:       String,
  pub last_name:        String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone:            Option<String>,
  pub role:             Role,
  pub status:           UserStatus,
  pub tontine_quota:    u32,
  pub tontines_created: u32,
  pub active:           bool,
  pub created_at:       DateTime<Utc>,
  pub approved_at:      Option<DateTime<Utc>>,
  pub approved_by:      Option<u64>,
  pub last_login_at:    Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
  fn from(u: User) -> Self {
    Self {
      id:               u.id,
      username:         u.username,
      email:            u.email,
      first_name:       u.first_name,
      last_name:        u.last_name,
      phone:            u.phone,
      role:             u.role,
      status:           u.status,
      tontine_quota:    u.tontine_quota,
      tontines_created: u.tontines_created,
      active:           u.active,
      created_at:       u.created_at,
      approved_at:      u.approved_at,
      approved_by:      u.approved_by,
      last_login_at:    u.last_login_at,
    }
  }
}

/// A [`RegistrationRequest`] without the password hash.
#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
  pub id:            u64,
  pub username:      String,
  pub email:         String,
  pub first_name:    String,
  pub last_name:     String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone:         Option<String>,
  pub motivation:    String,
  pub status:        RequestStatus,
  pub requested_at:  DateTime<Utc>,
  pub processed_at:  Option<DateTime<Utc>>,
  pub processed_by:  Option<u64>,
  pub admin_comment: Option<String>,
}

impl From<RegistrationRequest> for RegistrationResponse {
  fn from(r: RegistrationRequest) -> Self {
    Self {
      id:            r.id,
      username:      r.username,
      email:         r.email,
      first_name:    r.first_name,
      last_name:     r.last_name,
      phone:         r.phone,
      motivation:    r.motivation,
      status:        r.status,
      requested_at:  r.requested_at,
      processed_at:  r.processed_at,
      processed_by:  r.processed_by,
      admin_comment: r.admin_comment,
    }
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `POST /login`
pub async fn login<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  user: CurrentUser,
) -> Result<Json<UserResponse>, ApiError> {
  ledger.record_login(&user.0).await?;
  Ok(Json(user.0.into()))
}

/// `POST /register`
pub async fn register<S: BlobStore>(
  State(ledger): State<Arc<Ledger<S>>>,
  Json(body): Json<NewRegistration>,
) -> Result<impl IntoResponse, ApiError> {
  let request = ledger.register(body).await?;
  Ok((StatusCode::CREATED, Json(RegistrationResponse::from(request))))
}
