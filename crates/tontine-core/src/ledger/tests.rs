use chrono::{NaiveDate, Utc};

use super::*;
use crate::{
  account::{NewRegistration, RegistrationRequest, RequestStatus},
  activity::{ActivityAction, NewActivity, NewVisit},
  credential,
  memory::MemoryStore,
  tontine::{
    BeneficiarySource, NewParticipant, NewTontine, PaymentStatus, TontinePatch,
  },
};

// ─── Fixtures ────────────────────────────────────────────────────────────────

const ALICE: u64 = 2;
const BOB: u64 = 3;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn stored_user(id: u64, username: &str, quota: u32, created: u32) -> User {
  User {
    id,
    username: username.into(),
    email: format!("{username}@example.com"),
    first_name: username.into(),
    last_name: String::new(),
    phone: None,
    role: Role::User,
    status: UserStatus::Approved,
    tontine_quota: quota,
    tontines_created: created,
    active: true,
    created_at: Utc::now(),
    approved_at: None,
    approved_by: None,
    last_login_at: None,
    password_hash: String::new(),
  }
}

fn admin_config() -> LedgerConfig {
  LedgerConfig {
    admin: Some(BootstrapAdmin {
      username:      "superadmin".into(),
      email:         "admin@example.com".into(),
      password_hash: credential::hash_password("admin123").unwrap(),
    }),
    ..LedgerConfig::default()
  }
}

/// A ledger over a fresh in-memory store holding `users`.
async fn ledger_with(users: &[User], config: LedgerConfig) -> Ledger<MemoryStore> {
  let store = MemoryStore::new();
  store
    .set(Collection::Users, serde_json::to_string(users).unwrap())
    .await
    .unwrap();
  Ledger::new(store, config)
}

async fn ledger() -> Ledger<MemoryStore> {
  ledger_with(
    &[stored_user(ALICE, "alice", 5, 0), stored_user(BOB, "bob", 5, 0)],
    LedgerConfig::default(),
  )
  .await
}

fn new_tontine(name: &str, start: NaiveDate, duration: u32, capacity: u32) -> NewTontine {
  NewTontine {
    name:                 name.into(),
    monthly_amount:       25_000.0,
    participant_capacity: capacity,
    duration_months:      duration,
    description:          String::new(),
    start_date:           start,
  }
}

fn person(first: &str) -> NewParticipant {
  NewParticipant { first_name: first.into(), last_name: "Diallo".into(), parts: 1 }
}

async fn counter(ledger: &Ledger<MemoryStore>, id: u64) -> u32 {
  ledger.user(id).await.unwrap().unwrap().tontines_created
}

// ─── Tontines and quota ──────────────────────────────────────────────────────

#[tokio::test]
async fn create_increments_counter_and_lists() {
  let ledger = ledger().await;
  let t = ledger
    .create_tontine(new_tontine("Famille", d(2024, 1, 15), 6, 3), ALICE)
    .await
    .unwrap();

  assert_eq!(t.owner_id, ALICE);
  assert_eq!(t.end_date, d(2024, 7, 15));
  assert!(t.participants.is_empty());
  assert_eq!(counter(&ledger, ALICE).await, 1);
  assert_eq!(ledger.list_tontines(Some(ALICE)).await.unwrap().len(), 1);
  assert!(ledger.list_tontines(Some(BOB)).await.unwrap().is_empty());
  assert_eq!(ledger.list_tontines(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn quota_exhausted_until_a_delete() {
  let ledger = ledger_with(&[stored_user(ALICE, "alice", 1, 0)], LedgerConfig::default()).await;
  let first = ledger
    .create_tontine(new_tontine("One", d(2024, 1, 1), 3, 3), ALICE)
    .await
    .unwrap();
  assert_eq!(counter(&ledger, ALICE).await, 1);

  let err = ledger
    .create_tontine(new_tontine("Two", d(2024, 1, 1), 3, 3), ALICE)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::QuotaExceeded { quota: 1 }));
  assert_eq!(ledger.list_tontines(None).await.unwrap().len(), 1);

  ledger.delete_tontine(&first.id, ALICE).await.unwrap();
  assert_eq!(counter(&ledger, ALICE).await, 0);
  assert!(ledger.list_tontines(None).await.unwrap().is_empty());

  ledger
    .create_tontine(new_tontine("Two", d(2024, 1, 1), 3, 3), ALICE)
    .await
    .unwrap();
  assert_eq!(counter(&ledger, ALICE).await, 1);
}

#[tokio::test]
async fn delete_floors_counter_at_zero() {
  let ledger = ledger().await;
  let t = ledger
    .create_tontine(new_tontine("Famille", d(2024, 1, 1), 3, 3), ALICE)
    .await
    .unwrap();

  // A counter that drifted below the real count must not wrap.
  let mut users: Vec<User> = ledger.load(Collection::Users).await.unwrap();
  users.iter_mut().for_each(|u| u.tontines_created = 0);
  ledger.save(Collection::Users, &users).await.unwrap();

  ledger.delete_tontine(&t.id, ALICE).await.unwrap();
  assert_eq!(counter(&ledger, ALICE).await, 0);
}

#[tokio::test]
async fn unknown_owner_cannot_create() {
  let ledger = ledger().await;
  let err = ledger
    .create_tontine(new_tontine("Ghost", d(2024, 1, 1), 3, 3), 99)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn ownership_distinguishes_missing_from_foreign() {
  let ledger = ledger().await;
  let t = ledger
    .create_tontine(new_tontine("Famille", d(2024, 1, 1), 3, 3), ALICE)
    .await
    .unwrap();

  assert!(matches!(
    ledger.get_tontine("nope", Some(ALICE)).await.unwrap_err(),
    Error::NotFound(_)
  ));
  assert!(matches!(
    ledger.get_tontine(&t.id, Some(BOB)).await.unwrap_err(),
    Error::Forbidden(_)
  ));
  assert!(matches!(
    ledger.delete_tontine(&t.id, BOB).await.unwrap_err(),
    Error::Forbidden(_)
  ));
  assert!(matches!(
    ledger
      .update_tontine(&t.id, TontinePatch::default(), BOB)
      .await
      .unwrap_err(),
    Error::Forbidden(_)
  ));
  ledger.get_tontine(&t.id, None).await.unwrap();
  assert_eq!(counter(&ledger, ALICE).await, 1);
}

#[tokio::test]
async fn update_merges_and_guards_capacity() {
  let ledger = ledger().await;
  let t = ledger
    .create_tontine(new_tontine("Famille", d(2024, 1, 15), 6, 3), ALICE)
    .await
    .unwrap();
  ledger.add_participant(&t.id, person("Awa"), ALICE).await.unwrap();
  ledger.add_participant(&t.id, person("Moussa"), ALICE).await.unwrap();

  let err = ledger
    .update_tontine(
      &t.id,
      TontinePatch { participant_capacity: Some(1), ..TontinePatch::default() },
      ALICE,
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));

  let updated = ledger
    .update_tontine(
      &t.id,
      TontinePatch {
        name: Some("Famille élargie".into()),
        duration_months: Some(12),
        ..TontinePatch::default()
      },
      ALICE,
    )
    .await
    .unwrap();
  assert_eq!(updated.name, "Famille élargie");
  assert_eq!(updated.end_date, d(2025, 1, 15));
  assert_eq!(updated.monthly_amount, 25_000.0);
  assert_eq!(updated.participants.len(), 2);
}

#[tokio::test]
async fn oversized_duration_is_refused() {
  let ledger = ledger().await;
  let err = ledger
    .create_tontine(new_tontine("Longue", d(2024, 1, 1), u32::MAX, 3), ALICE)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
  assert!(ledger.list_tontines(None).await.unwrap().is_empty());
  assert_eq!(counter(&ledger, ALICE).await, 0);

  let t = ledger
    .create_tontine(new_tontine("Famille", d(2024, 1, 15), 6, 3), ALICE)
    .await
    .unwrap();
  let err = ledger
    .update_tontine(
      &t.id,
      TontinePatch { duration_months: Some(3_500_000), ..TontinePatch::default() },
      ALICE,
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));

  let stored = ledger.get_tontine(&t.id, Some(ALICE)).await.unwrap();
  assert_eq!(stored.duration_months, 6);
  assert_eq!(stored.end_date, d(2024, 7, 15));
  assert_eq!(ledger.schedule(&t.id, Some(ALICE)).await.unwrap().len(), 6);
}

// ─── Participants ────────────────────────────────────────────────────────────

#[tokio::test]
async fn capacity_is_enforced() {
  let ledger = ledger().await;
  let t = ledger
    .create_tontine(new_tontine("Duo", d(2024, 1, 1), 2, 2), ALICE)
    .await
    .unwrap();
  ledger.add_participant(&t.id, person("Awa"), ALICE).await.unwrap();
  ledger.add_participant(&t.id, person("Moussa"), ALICE).await.unwrap();

  let err = ledger
    .add_participant(&t.id, person("Fatou"), ALICE)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CapacityReached { capacity: 2 }));
}

#[tokio::test]
async fn removal_purges_payments_and_beneficiaries() {
  let ledger = ledger().await;
  let t = ledger
    .create_tontine(new_tontine("Famille", d(2024, 1, 1), 6, 3), ALICE)
    .await
    .unwrap();
  let awa = ledger.add_participant(&t.id, person("Awa"), ALICE).await.unwrap();
  let moussa = ledger.add_participant(&t.id, person("Moussa"), ALICE).await.unwrap();
  ledger
    .set_payment_status(&t.id, &awa.id, 1, PaymentStatus::Paid, ALICE)
    .await
    .unwrap();
  ledger.set_beneficiary(&t.id, &awa.id, 3, ALICE).await.unwrap();

  ledger.remove_participant(&awa.id, &t.id, ALICE).await.unwrap();
  let t = ledger.get_tontine(&t.id, None).await.unwrap();
  assert_eq!(t.participants.len(), 1);
  assert_eq!(t.participant_order, vec![moussa.id.clone()]);
  assert!(t.payments.is_empty());
  assert!(t.beneficiaries.is_empty());

  let err = ledger
    .remove_participant(&awa.id, &t.id, ALICE)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

// ─── Payments and beneficiaries ──────────────────────────────────────────────

#[tokio::test]
async fn family_scenario() {
  let ledger = ledger().await;
  let t = ledger
    .create_tontine(new_tontine("Famille", d(2024, 1, 15), 6, 3), ALICE)
    .await
    .unwrap();
  let mut ids = Vec::new();
  for name in ["Awa", "Moussa", "Fatou"] {
    ids.push(ledger.add_participant(&t.id, person(name), ALICE).await.unwrap().id);
  }
  for id in &ids[..2] {
    ledger
      .set_payment_status(&t.id, id, 1, PaymentStatus::Paid, ALICE)
      .await
      .unwrap();
  }

  let t = ledger.get_tontine(&t.id, Some(ALICE)).await.unwrap();
  assert_eq!(t.end_date, d(2024, 7, 15));
  assert_eq!(t.collected_amount(1), 50_000.0);
  assert_eq!(t.payment_ratio(1).to_string(), "2/3");

  let report = ledger.monthly_report(&t.id, 1, Some(ALICE)).await.unwrap().unwrap();
  assert_eq!(report.total_collected, 50_000.0);
  assert_eq!(report.paid_count, 2);
  assert_eq!(report.beneficiary_name.as_deref(), Some("Awa Diallo"));
  assert!(ledger.monthly_report(&t.id, 1, Some(BOB)).await.unwrap().is_none());
  assert!(ledger.monthly_report("nope", 1, None).await.unwrap().is_none());
  for month in [0, 7] {
    let err = ledger.monthly_report(&t.id, month, Some(ALICE)).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  let months = ledger.schedule(&t.id, Some(ALICE)).await.unwrap();
  assert_eq!(months.len(), 6);
  assert_eq!(months[0].ratio, "2/3");
}

#[tokio::test]
async fn payment_round_trip() {
  let ledger = ledger().await;
  let t = ledger
    .create_tontine(new_tontine("Famille", d(2024, 1, 1), 6, 3), ALICE)
    .await
    .unwrap();
  let awa = ledger.add_participant(&t.id, person("Awa"), ALICE).await.unwrap();

  let status = |m| ledger.get_payment_status(&t.id, &awa.id, m, None);
  assert_eq!(status(2).await.unwrap(), PaymentStatus::Unpaid);

  ledger
    .set_payment_status(&t.id, &awa.id, 2, PaymentStatus::Paid, ALICE)
    .await
    .unwrap();
  assert_eq!(status(2).await.unwrap(), PaymentStatus::Paid);

  ledger
    .set_payment_status(&t.id, &awa.id, 2, PaymentStatus::Unpaid, ALICE)
    .await
    .unwrap();
  assert_eq!(status(2).await.unwrap(), PaymentStatus::Unpaid);

  assert!(matches!(
    ledger
      .set_payment_status(&t.id, &awa.id, 7, PaymentStatus::Paid, ALICE)
      .await
      .unwrap_err(),
    Error::Validation(_)
  ));
  assert!(matches!(
    ledger
      .set_payment_status(&t.id, "nobody", 1, PaymentStatus::Paid, ALICE)
      .await
      .unwrap_err(),
    Error::NotFound(_)
  ));
}

#[tokio::test]
async fn bulk_month_payments() {
  let ledger = ledger().await;
  let t = ledger
    .create_tontine(new_tontine("Famille", d(2024, 1, 1), 6, 3), ALICE)
    .await
    .unwrap();
  for name in ["Awa", "Moussa", "Fatou"] {
    ledger.add_participant(&t.id, person(name), ALICE).await.unwrap();
  }

  let touched = ledger
    .set_month_payments(&t.id, 4, PaymentStatus::Paid, ALICE)
    .await
    .unwrap();
  assert_eq!(touched, 3);
  let t = ledger.get_tontine(&t.id, None).await.unwrap();
  assert_eq!(t.paid_count(4), 3);

  ledger
    .set_month_payments(&t.id, 4, PaymentStatus::Unpaid, ALICE)
    .await
    .unwrap();
  let t = ledger.get_tontine(&t.id, None).await.unwrap();
  assert_eq!(t.paid_count(4), 0);
}

#[tokio::test]
async fn beneficiary_last_write_wins() {
  let ledger = ledger().await;
  let t = ledger
    .create_tontine(new_tontine("Famille", d(2024, 1, 1), 6, 3), ALICE)
    .await
    .unwrap();
  let awa = ledger.add_participant(&t.id, person("Awa"), ALICE).await.unwrap();
  let moussa = ledger.add_participant(&t.id, person("Moussa"), ALICE).await.unwrap();

  let rotation = ledger.get_beneficiary(&t.id, 2, None).await.unwrap().unwrap();
  assert_eq!(rotation.participant_id, moussa.id);
  assert_eq!(rotation.source, BeneficiarySource::Rotation);

  ledger.set_beneficiary(&t.id, &moussa.id, 1, ALICE).await.unwrap();
  ledger.set_beneficiary(&t.id, &awa.id, 1, ALICE).await.unwrap();
  let explicit = ledger.get_beneficiary(&t.id, 1, None).await.unwrap().unwrap();
  assert_eq!(explicit.participant_id, awa.id);
  assert_eq!(explicit.source, BeneficiarySource::Explicit);

  assert!(ledger.get_beneficiary(&t.id, 5, None).await.unwrap().is_none());
}

#[tokio::test]
async fn finalize_month_once() {
  let ledger = ledger().await;
  let t = ledger
    .create_tontine(new_tontine("Famille", d(2024, 1, 1), 6, 3), ALICE)
    .await
    .unwrap();
  assert!(matches!(
    ledger.finalize_month(&t.id, 1, ALICE).await.unwrap_err(),
    Error::Validation(_)
  ));

  let awa = ledger.add_participant(&t.id, person("Awa"), ALICE).await.unwrap();
  ledger
    .set_payment_status(&t.id, &awa.id, 1, PaymentStatus::Paid, ALICE)
    .await
    .unwrap();
  let closed = ledger.finalize_month(&t.id, 1, ALICE).await.unwrap();
  assert_eq!(closed.beneficiary_id, awa.id);
  assert_eq!(closed.amount, 25_000.0);

  assert!(matches!(
    ledger.finalize_month(&t.id, 1, ALICE).await.unwrap_err(),
    Error::Conflict(_)
  ));
  let report = ledger.monthly_report(&t.id, 1, None).await.unwrap().unwrap();
  assert!(report.finalized);
}

// ─── Identity ────────────────────────────────────────────────────────────────

fn registration(username: &str, email: &str) -> NewRegistration {
  NewRegistration {
    username:   username.into(),
    email:      email.into(),
    first_name: "Koffi".into(),
    last_name:  "Mensah".into(),
    phone:      None,
    password:   "s3cret".into(),
    motivation: "family group".into(),
  }
}

#[tokio::test]
async fn registration_conflicts() {
  let ledger = ledger().await;

  let err = ledger
    .register(registration("alice", "new@example.com"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Conflict(_)));
  let err = ledger
    .register(registration("newcomer", "bob@example.com"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Conflict(_)));

  let request = ledger
    .register(registration("koffi", "koffi@example.com"))
    .await
    .unwrap();
  assert_eq!(request.status, RequestStatus::Pending);
  assert!(credential::verify_password("s3cret", &request.password_hash));

  let err = ledger
    .register(registration("koffi", "other@example.com"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Conflict(_)));

  let requests: Vec<RegistrationRequest> =
    ledger.load(Collection::RegistrationRequests).await.unwrap();
  assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn bootstrap_admin_identity_is_reserved() {
  let ledger = ledger_with(&[], admin_config()).await;
  for candidate in [
    registration("superadmin", "fresh@example.com"),
    registration("impostor", "admin@example.com"),
  ] {
    let err = ledger.register(candidate).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
  }
  let requests: Vec<RegistrationRequest> =
    ledger.load(Collection::RegistrationRequests).await.unwrap();
  assert!(requests.is_empty());
}

#[tokio::test]
async fn registration_requires_fields() {
  let ledger = ledger().await;
  let err = ledger.register(registration("  ", "x@example.com")).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn approve_then_sign_in() {
  let ledger = ledger_with(&[], admin_config()).await;
  let request = ledger
    .register(registration("koffi", "koffi@example.com"))
    .await
    .unwrap();

  assert!(ledger.verify("koffi", "s3cret").await.unwrap().is_none());

  let user = ledger.approve(request.id, BOOTSTRAP_ADMIN_ID, 2).await.unwrap();
  assert_eq!(user.id, 2);
  assert_eq!(user.tontine_quota, 2);
  assert_eq!(user.tontines_created, 0);
  assert_eq!(user.role, Role::User);

  let signed_in = ledger.authenticate("koffi", "s3cret").await.unwrap().unwrap();
  assert_eq!(signed_in.id, user.id);
  assert!(ledger.authenticate("koffi", "wrong").await.unwrap().is_none());
  assert!(ledger.user(user.id).await.unwrap().unwrap().last_login_at.is_some());

  let log = ledger.activity(10, None).await.unwrap();
  assert_eq!(log[0].action, ActivityAction::Login);
  assert_eq!(log[0].username, "koffi");
  assert_eq!(log[1].action, ActivityAction::UserApproved);
  assert_eq!(log[1].username, "superadmin");
  assert_eq!(log[1].target_user_id, Some(user.id));

  assert!(matches!(
    ledger.approve(request.id, BOOTSTRAP_ADMIN_ID, 2).await.unwrap_err(),
    Error::Conflict(_)
  ));
}

#[tokio::test]
async fn rejected_username_can_apply_again() {
  let ledger = ledger_with(&[], admin_config()).await;
  let request = ledger
    .register(registration("koffi", "koffi@example.com"))
    .await
    .unwrap();
  let rejected = ledger
    .reject(request.id, BOOTSTRAP_ADMIN_ID, Some("unknown applicant".into()))
    .await
    .unwrap();
  assert_eq!(rejected.status, RequestStatus::Rejected);
  assert_eq!(rejected.admin_comment.as_deref(), Some("unknown applicant"));

  ledger
    .register(registration("koffi", "koffi@example.com"))
    .await
    .unwrap();
  assert!(matches!(
    ledger.reject(99, BOOTSTRAP_ADMIN_ID, None).await.unwrap_err(),
    Error::NotFound(_)
  ));
}

#[tokio::test]
async fn admin_operations_need_admin_role() {
  let ledger = ledger_with(&[stored_user(ALICE, "alice", 1, 0)], admin_config()).await;
  let request = ledger
    .register(registration("koffi", "koffi@example.com"))
    .await
    .unwrap();

  assert!(matches!(
    ledger.approve(request.id, ALICE, 1).await.unwrap_err(),
    Error::Forbidden(_)
  ));
  assert!(matches!(ledger.users(ALICE).await.unwrap_err(), Error::Forbidden(_)));
  assert!(matches!(
    ledger.set_quota(ALICE, 10, ALICE).await.unwrap_err(),
    Error::Forbidden(_)
  ));
  assert_eq!(ledger.users(BOOTSTRAP_ADMIN_ID).await.unwrap().len(), 1);
}

#[tokio::test]
async fn quota_and_status_changes_are_logged() {
  let ledger = ledger_with(&[stored_user(ALICE, "alice", 1, 0)], admin_config()).await;

  let alice = ledger.set_quota(ALICE, 3, BOOTSTRAP_ADMIN_ID).await.unwrap();
  assert_eq!(alice.tontine_quota, 3);
  let active = ledger.toggle_active(ALICE, BOOTSTRAP_ADMIN_ID).await.unwrap();
  assert!(!active);
  assert!(!ledger.user(ALICE).await.unwrap().unwrap().can_sign_in());

  let log = ledger.activity(10, None).await.unwrap();
  assert_eq!(log[0].action, ActivityAction::UserStatusChanged);
  assert_eq!(log[0].details, "alice: active → inactive");
  assert_eq!(log[1].details, "quota for alice: 1 → 3");

  assert!(matches!(
    ledger.set_quota(42, 1, BOOTSTRAP_ADMIN_ID).await.unwrap_err(),
    Error::NotFound(_)
  ));
  assert!(matches!(
    ledger.toggle_active(BOOTSTRAP_ADMIN_ID, BOOTSTRAP_ADMIN_ID).await.unwrap_err(),
    Error::Forbidden(_)
  ));
}

#[tokio::test]
async fn bootstrap_admin_signs_in_outside_the_store() {
  let ledger = ledger_with(&[], admin_config()).await;
  let admin = ledger.verify("superadmin", "admin123").await.unwrap().unwrap();
  assert_eq!(admin.id, BOOTSTRAP_ADMIN_ID);
  assert_eq!(admin.role, Role::SuperAdmin);
  assert_eq!(admin.tontine_quota, 999);
  assert!(ledger.verify("superadmin", "wrong").await.unwrap().is_none());

  ledger
    .create_tontine(new_tontine("Admin's", d(2024, 1, 1), 3, 3), BOOTSTRAP_ADMIN_ID)
    .await
    .unwrap();
  assert_eq!(counter(&ledger, BOOTSTRAP_ADMIN_ID).await, 1);
  let users: Vec<User> = ledger.load(Collection::Users).await.unwrap();
  assert!(users.is_empty());
}

#[tokio::test]
async fn suspended_user_cannot_sign_in() {
  let mut alice = stored_user(ALICE, "alice", 1, 0);
  alice.password_hash = credential::hash_password("pw").unwrap();
  alice.active = false;
  let ledger = ledger_with(&[alice], LedgerConfig::default()).await;
  assert!(ledger.verify("alice", "pw").await.unwrap().is_none());
}

// ─── Activity and visitors ───────────────────────────────────────────────────

#[tokio::test]
async fn activity_keeps_the_newest_hundred() {
  let ledger = ledger().await;
  for i in 0..101 {
    ledger
      .record_activity(
        NewActivity::new(ActivityAction::TontineUpdated, format!("edit {i}")).actor(ALICE),
      )
      .await
      .unwrap();
  }
  let log = ledger.activity(usize::MAX, None).await.unwrap();
  assert_eq!(log.len(), 100);
  assert_eq!(log[0].details, "edit 100");
  assert_eq!(log[99].details, "edit 1");
  assert!(log.windows(2).all(|w| w[0].id > w[1].id));
}

#[tokio::test]
async fn actor_names_are_resolved() {
  let ledger = ledger().await;
  let system = ledger
    .record_activity(NewActivity::new(ActivityAction::TontineDeleted, "cleanup"))
    .await
    .unwrap();
  assert_eq!(system.username, "system");
  let ghost = ledger
    .record_activity(NewActivity::new(ActivityAction::TontineDeleted, "cleanup").actor(77))
    .await
    .unwrap();
  assert_eq!(ghost.username, "unknown user");
  let alice = ledger
    .record_activity(NewActivity::new(ActivityAction::TontineDeleted, "cleanup").actor(ALICE))
    .await
    .unwrap();
  assert_eq!(alice.username, "alice");

  let own = ledger.activity(10, Some(ALICE)).await.unwrap();
  assert_eq!(own.len(), 1);
  assert_eq!(own[0].id, alice.id);
}

#[tokio::test]
async fn empty_log_is_seeded_only_when_unscoped() {
  let ledger = ledger().await;
  assert!(ledger.activity(10, Some(ALICE)).await.unwrap().is_empty());

  let seeded = ledger.activity(10, None).await.unwrap();
  assert_eq!(seeded.len(), 3);
  assert_eq!(seeded[0].id, 3);
  assert_eq!(ledger.activity(10, None).await.unwrap().len(), 3);

  let quiet = ledger_with(&[], LedgerConfig {
    seed_example_activity: false,
    ..LedgerConfig::default()
  })
  .await;
  assert!(quiet.activity(10, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn visits_are_capped_and_counted() {
  let ledger = ledger_with(&[], LedgerConfig {
    visitor_retention: 5,
    ..LedgerConfig::default()
  })
  .await;
  for i in 0..7u64 {
    ledger
      .record_visit(NewVisit {
        path: format!("/page/{i}"),
        user_id: (i % 2 == 0).then_some(ALICE),
        ..NewVisit::default()
      })
      .await
      .unwrap();
  }
  let visits = ledger.visitors(100).await.unwrap();
  assert_eq!(visits.len(), 5);
  assert_eq!(visits[0].path, "/page/6");
  assert_eq!(visits[0].ip, "local");

  let stats = ledger.visitor_stats(Utc::now()).await.unwrap();
  assert_eq!(stats.total, 5);
  assert_eq!(stats.today, 5);
  assert_eq!(stats.authenticated, 3);
  assert_eq!(stats.anonymous, 2);
}

// ─── Statistics ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn statistics_scoping() {
  let ledger = ledger().await;
  let today = crate::schedule::today();
  let running = ledger
    .create_tontine(new_tontine("Now", today, 6, 3), ALICE)
    .await
    .unwrap();
  ledger.add_participant(&running.id, person("Awa"), ALICE).await.unwrap();
  ledger
    .create_tontine(new_tontine("Old", d(2001, 1, 1), 2, 3), BOB)
    .await
    .unwrap();
  ledger
    .register(registration("koffi", "koffi@example.com"))
    .await
    .unwrap();

  let mine = ledger.statistics(Some(ALICE)).await.unwrap();
  assert_eq!(mine.total_tontines, 1);
  assert_eq!(mine.total_participants, 1);
  assert_eq!(mine.active_tontines, 1);
  assert_eq!(mine.total_users, None);

  let all = ledger.statistics(None).await.unwrap();
  assert_eq!(all.total_tontines, 2);
  assert_eq!(all.total_monthly_amount, 50_000.0);
  assert_eq!(all.active_tontines, 1);
  assert_eq!(all.total_users, Some(2));
  assert_eq!(all.active_users, Some(2));
  assert_eq!(all.pending_requests, Some(1));
}

#[test]
fn ids_start_above_the_floor() {
  assert_eq!(next_id([], BOOTSTRAP_ADMIN_ID), 2);
  assert_eq!(next_id([2, 9, 4], BOOTSTRAP_ADMIN_ID), 10);
  assert_eq!(next_id([], 0), 1);
}
