//! Sign-in, registration and the administrator's user management.

use chrono::Utc;
use tracing::{info, warn};

use super::{Ledger, next_id};
use crate::{
  Error, Result,
  account::{
    BOOTSTRAP_ADMIN_ID, NewRegistration, RegistrationRequest, RequestStatus,
    Role, User, UserStatus,
  },
  activity::{ActivityAction, NewActivity},
  credential,
  store::{BlobStore, Collection},
};

impl<S: BlobStore> Ledger<S> {
  /// Check credentials without side effects.
  ///
  /// The configured bootstrap administrator is tried first and never touches
  /// the `users` collection. Store users must be active and approved.
  pub async fn verify(&self, username: &str, password: &str) -> Result<Option<User>> {
    if let Some(admin) = &self.config.admin
      && admin.username == username
      && credential::verify_password(password, &admin.password_hash)
    {
      return self.bootstrap_user().await;
    }

    let users = self.load_users().await?;
    Ok(users.into_iter().find(|u| {
      u.username == username
        && u.can_sign_in()
        && credential::verify_password(password, &u.password_hash)
    }))
  }

  /// [`Self::verify`], then [`Self::record_login`] on success.
  pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
    match self.verify(username, password).await? {
      Some(user) => {
        self.record_login(&user).await?;
        Ok(Some(user))
      }
      None => {
        warn!(username, "sign-in refused");
        Ok(None)
      }
    }
  }

  /// Stamp `last_login_at` and append a `login` entry.
  pub async fn record_login(&self, user: &User) -> Result<()> {
    let _guard = self.lock().await;
    if user.id != BOOTSTRAP_ADMIN_ID {
      let mut users = self.load_users().await?;
      if let Some(stored) = users.iter_mut().find(|u| u.id == user.id) {
        stored.last_login_at = Some(Utc::now());
        self.save(Collection::Users, &users).await?;
      }
    }
    self
      .append_activity(
        NewActivity::new(ActivityAction::Login, format!("{} signed in", user.username))
          .actor(user.id),
      )
      .await?;
    info!(user_id = user.id, username = %user.username, "signed in");
    Ok(())
  }

  // ── Registration ──────────────────────────────────────────────────────────

  /// File a pending registration request.
  pub async fn register(&self, candidate: NewRegistration) -> Result<RegistrationRequest> {
    let username = candidate.username.trim().to_owned();
    let email = candidate.email.trim().to_owned();
    if username.is_empty() || email.is_empty() || candidate.password.is_empty() {
      return Err(Error::Validation(
        "username, email and password are required".into(),
      ));
    }
    let password_hash = credential::hash_password(&candidate.password)?;

    let _guard = self.lock().await;
    let users = self.load_users().await?;
    let mut requests: Vec<RegistrationRequest> =
      self.load(Collection::RegistrationRequests).await?;

    let claims_admin = self
      .config
      .admin
      .as_ref()
      .is_some_and(|a| a.username == username || a.email == email);
    if claims_admin
      || users.iter().any(|u| u.username == username || u.email == email)
    {
      warn!(%username, "registration conflicts with an existing user");
      return Err(Error::Conflict("username or email already in use".into()));
    }
    if requests
      .iter()
      .any(|r| r.is_pending() && r.claims(&username, &email))
    {
      warn!(%username, "registration conflicts with a pending request");
      return Err(Error::Conflict(
        "a pending request already uses this username or email".into(),
      ));
    }

    let request = RegistrationRequest {
      id: next_id(requests.iter().map(|r| r.id), 0),
      username,
      email,
      first_name: candidate.first_name,
      last_name: candidate.last_name,
      phone: candidate.phone,
      password_hash,
      motivation: candidate.motivation,
      status: RequestStatus::Pending,
      requested_at: Utc::now(),
      processed_at: None,
      processed_by: None,
      admin_comment: None,
    };
    requests.push(request.clone());
    self
      .save(Collection::RegistrationRequests, &requests)
      .await?;
    self
      .append_activity(NewActivity::new(
        ActivityAction::RegistrationRequested,
        format!("registration requested by {}", request.username),
      ))
      .await?;
    info!(request_id = request.id, username = %request.username, "registration requested");
    Ok(request)
  }

  /// Approve a pending request, creating an approved user with `quota`.
  pub async fn approve(&self, request_id: u64, approver_id: u64, quota: u32) -> Result<User> {
    self.require_admin(approver_id).await?;
    let _guard = self.lock().await;
    let mut requests: Vec<RegistrationRequest> =
      self.load(Collection::RegistrationRequests).await?;
    let mut users = self.load_users().await?;

    let request = requests
      .iter_mut()
      .find(|r| r.id == request_id)
      .ok_or_else(|| Error::NotFound(format!("registration request {request_id}")))?;
    if !request.is_pending() {
      return Err(Error::Conflict(format!(
        "registration request {request_id} was already processed"
      )));
    }
    if users
      .iter()
      .any(|u| u.username == request.username || u.email == request.email)
    {
      return Err(Error::Conflict("username or email already in use".into()));
    }

    let now = Utc::now();
    let user = User {
      id:               next_id(users.iter().map(|u| u.id), BOOTSTRAP_ADMIN_ID),
      username:         request.username.clone(),
      email:            request.email.clone(),
      first_name:       request.first_name.clone(),
      last_name:        request.last_name.clone(),
      phone:            request.phone.clone(),
      role:             Role::User,
      status:           UserStatus::Approved,
      tontine_quota:    quota,
      tontines_created: 0,
      active:           true,
      created_at:       now,
      approved_at:      Some(now),
      approved_by:      Some(approver_id),
      last_login_at:    None,
      password_hash:    request.password_hash.clone(),
    };
    request.status = RequestStatus::Approved;
    request.processed_at = Some(now);
    request.processed_by = Some(approver_id);

    users.push(user.clone());
    self.save(Collection::Users, &users).await?;
    self
      .save(Collection::RegistrationRequests, &requests)
      .await?;
    self
      .append_activity(
        NewActivity::new(
          ActivityAction::UserApproved,
          format!("{} approved with a quota of {quota}", user.username),
        )
        .actor(approver_id)
        .target(user.id),
      )
      .await?;
    info!(request_id, user_id = user.id, quota, "registration approved");
    Ok(user)
  }

  /// Reject a pending request, keeping `reason` as the admin comment.
  pub async fn reject(
    &self,
    request_id: u64,
    approver_id: u64,
    reason: Option<String>,
  ) -> Result<RegistrationRequest> {
    self.require_admin(approver_id).await?;
    let _guard = self.lock().await;
    let mut requests: Vec<RegistrationRequest> =
      self.load(Collection::RegistrationRequests).await?;

    let request = requests
      .iter_mut()
      .find(|r| r.id == request_id)
      .ok_or_else(|| Error::NotFound(format!("registration request {request_id}")))?;
    if !request.is_pending() {
      return Err(Error::Conflict(format!(
        "registration request {request_id} was already processed"
      )));
    }
    request.status = RequestStatus::Rejected;
    request.processed_at = Some(Utc::now());
    request.processed_by = Some(approver_id);
    request.admin_comment = reason.filter(|r| !r.trim().is_empty());
    let rejected = request.clone();

    self
      .save(Collection::RegistrationRequests, &requests)
      .await?;
    let details = match &rejected.admin_comment {
      Some(reason) => format!("{} rejected: {reason}", rejected.username),
      None => format!("{} rejected", rejected.username),
    };
    self
      .append_activity(
        NewActivity::new(ActivityAction::UserRejected, details).actor(approver_id),
      )
      .await?;
    info!(request_id, "registration rejected");
    Ok(rejected)
  }

  // ── User management ───────────────────────────────────────────────────────

  /// Flip a user's `active` flag. Returns the new value.
  pub async fn toggle_active(&self, user_id: u64, actor_id: u64) -> Result<bool> {
    self.require_admin(actor_id).await?;
    if user_id == BOOTSTRAP_ADMIN_ID && self.config.admin.is_some() {
      return Err(Error::Forbidden(
        "the bootstrap administrator cannot be modified".into(),
      ));
    }
    let _guard = self.lock().await;
    let mut users = self.load_users().await?;
    let user = users
      .iter_mut()
      .find(|u| u.id == user_id)
      .ok_or_else(|| Error::NotFound(format!("user {user_id}")))?;
    user.active = !user.active;
    let (active, username) = (user.active, user.username.clone());

    self.save(Collection::Users, &users).await?;
    let (before, after) = if active { ("inactive", "active") } else { ("active", "inactive") };
    self
      .append_activity(
        NewActivity::new(
          ActivityAction::UserStatusChanged,
          format!("{username}: {before} → {after}"),
        )
        .actor(actor_id)
        .target(user_id),
      )
      .await?;
    info!(user_id, active, "user status changed");
    Ok(active)
  }

  /// Set a user's tontine quota.
  pub async fn set_quota(&self, user_id: u64, quota: u32, actor_id: u64) -> Result<User> {
    self.require_admin(actor_id).await?;
    if user_id == BOOTSTRAP_ADMIN_ID && self.config.admin.is_some() {
      return Err(Error::Forbidden(
        "the bootstrap administrator cannot be modified".into(),
      ));
    }
    let _guard = self.lock().await;
    let mut users = self.load_users().await?;
    let user = users
      .iter_mut()
      .find(|u| u.id == user_id)
      .ok_or_else(|| Error::NotFound(format!("user {user_id}")))?;
    let before = user.tontine_quota;
    user.tontine_quota = quota;
    let updated = user.clone();

    self.save(Collection::Users, &users).await?;
    self
      .append_activity(
        NewActivity::new(
          ActivityAction::UserQuotaChanged,
          format!("quota for {}: {before} → {quota}", updated.username),
        )
        .actor(actor_id)
        .target(user_id),
      )
      .await?;
    info!(user_id, before, quota, "user quota changed");
    Ok(updated)
  }

  /// Every stored user. Administrators only.
  pub async fn users(&self, actor_id: u64) -> Result<Vec<User>> {
    self.require_admin(actor_id).await?;
    self.load_users().await
  }

  /// Every registration request, newest first. Administrators only.
  pub async fn registrations(&self, actor_id: u64) -> Result<Vec<RegistrationRequest>> {
    self.require_admin(actor_id).await?;
    let mut requests: Vec<RegistrationRequest> =
      self.load(Collection::RegistrationRequests).await?;
    requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
    Ok(requests)
  }
}
