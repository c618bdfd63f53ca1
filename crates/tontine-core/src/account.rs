//! User accounts and self-service registration requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id reserved for the configured bootstrap administrator. Stored users are
/// always numbered above it.
pub const BOOTSTRAP_ADMIN_ID: u64 = 1;

/// Tontine quota granted to the bootstrap administrator.
pub const BOOTSTRAP_ADMIN_QUOTA: u32 = 999;

// ─── Enums ───────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  SuperAdmin,
  Admin,
  #[default]
  User,
}

impl Role {
  pub fn is_admin(self) -> bool { matches!(self, Self::SuperAdmin | Self::Admin) }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
  Suspended,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A person allowed to sign in. Stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:               u64,
  pub username:         String,
  #[serde(default)]
  pub email:            String,
  #[serde(default)]
  pub first_name:       String,
  #[serde(default)]
  pub last_name:        String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone:            Option<String>,
  #[serde(default)]
  pub role:             Role,
  #[serde(default)]
  pub status:           UserStatus,
  /// Maximum number of tontines this user may own at once.
  #[serde(default)]
  pub tontine_quota:    u32,
  /// Number of tontines currently owned.
  #[serde(default)]
  pub tontines_created: u32,
  #[serde(default)]
  pub active:           bool,
  #[serde(default = "Utc::now")]
  pub created_at:       DateTime<Utc>,
  #[serde(default)]
  pub approved_at:      Option<DateTime<Utc>>,
  #[serde(default)]
  pub approved_by:      Option<u64>,
  #[serde(default)]
  pub last_login_at:    Option<DateTime<Utc>>,
  /// argon2 PHC string. Empty means the account cannot sign in.
  #[serde(default)]
  pub password_hash:    String,
}

impl User {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name).trim().to_owned()
  }

  /// Whether the account may sign in at all.
  pub fn can_sign_in(&self) -> bool {
    self.active && self.status == UserStatus::Approved
  }

  pub fn is_admin(&self) -> bool { self.role.is_admin() }
}

// ─── Registration ────────────────────────────────────────────────────────────

/// A pending (or decided) application for an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
  pub id:            u64,
  pub username:      String,
  #[serde(default)]
  pub email:         String,
  #[serde(default)]
  pub first_name:    String,
  #[serde(default)]
  pub last_name:     String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone:         Option<String>,
  #[serde(default)]
  pub password_hash: String,
  /// Why the applicant wants an account.
  #[serde(default)]
  pub motivation:    String,
  #[serde(default)]
  pub status:        RequestStatus,
  #[serde(default = "Utc::now")]
  pub requested_at:  DateTime<Utc>,
  #[serde(default)]
  pub processed_at:  Option<DateTime<Utc>>,
  #[serde(default)]
  pub processed_by:  Option<u64>,
  /// Reason given when the request was rejected.
  #[serde(default)]
  pub admin_comment: Option<String>,
}

impl RegistrationRequest {
  pub fn is_pending(&self) -> bool { self.status == RequestStatus::Pending }

  /// Whether this request already claims `username` or `email`.
  pub fn claims(&self, username: &str, email: &str) -> bool {
    self.username == username || self.email == email
  }
}

/// Input to [`crate::Ledger::register`]. The password is hashed before
/// anything is stored.
#[derive(Clone, Deserialize)]
pub struct NewRegistration {
  pub username:   String,
  pub email:      String,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub last_name:  String,
  #[serde(default)]
  pub phone:      Option<String>,
  pub password:   String,
  #[serde(default)]
  pub motivation: String,
}

impl std::fmt::Debug for NewRegistration {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("NewRegistration")
      .field("username", &self.username)
      .field("email", &self.email)
      .field("first_name", &self.first_name)
      .field("last_name", &self.last_name)
      .finish_non_exhaustive()
  }
}
