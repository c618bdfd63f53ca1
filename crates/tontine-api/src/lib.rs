//! JSON REST API for the tontine ledger.
//!
//! Exposes an axum [`Router`] over a [`Ledger`] backed by any
//! [`BlobStore`]. Every route except `POST /register` requires HTTP Basic
//! credentials. TLS and listening are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tontine_api::api_router(ledger.clone()))
//! ```

pub mod auth;
pub mod error;
pub mod etag;
pub mod handlers;

use std::sync::Arc;

use axum::{
  Router, middleware,
  routing::{get, post, put},
};
use tontine_core::{Ledger, store::BlobStore};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
use handlers::{account, admin, months, participants, tontines};

/// Build a fully-materialised API router for `ledger`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(ledger: Arc<Ledger<S>>) -> Router<()>
where
  S: BlobStore + 'static,
{
  Router::new()
    // Account
    .route("/login", post(account::login::<S>))
    .route("/register", post(account::register::<S>))
    // Tontines
    .route("/tontines", get(tontines::list::<S>).post(tontines::create::<S>))
    .route(
      "/tontines/{id}",
      get(tontines::get_one::<S>)
        .patch(tontines::update::<S>)
        .delete(tontines::delete::<S>),
    )
    .route("/tontines/{id}/schedule", get(tontines::schedule::<S>))
    // Participants
    .route("/tontines/{id}/participants", post(participants::add::<S>))
    .route(
      "/tontines/{id}/participants/{pid}",
      axum::routing::delete(participants::remove::<S>),
    )
    // Months
    .route(
      "/tontines/{id}/months/{month}/payments/{pid}",
      get(months::get_payment::<S>).put(months::set_payment::<S>),
    )
    .route("/tontines/{id}/months/{month}/payments", put(months::set_month::<S>))
    .route(
      "/tontines/{id}/months/{month}/beneficiary",
      get(months::get_beneficiary::<S>).put(months::set_beneficiary::<S>),
    )
    .route("/tontines/{id}/months/{month}/finalize", post(months::finalize::<S>))
    .route("/tontines/{id}/months/{month}/report", get(months::report::<S>))
    // Aggregates
    .route("/statistics", get(tontines::statistics::<S>))
    .route("/activity", get(tontines::activity::<S>))
    // Administration
    .route("/admin/users", get(admin::users::<S>))
    .route("/admin/users/{id}/toggle-active", post(admin::toggle_active::<S>))
    .route("/admin/users/{id}/quota", put(admin::set_quota::<S>))
    .route("/admin/registrations", get(admin::registrations::<S>))
    .route("/admin/registrations/{id}/approve", post(admin::approve::<S>))
    .route("/admin/registrations/{id}/reject", post(admin::reject::<S>))
    .route("/admin/visitors", get(admin::visitors::<S>))
    .route("/admin/visitors/stats", get(admin::visitor_stats::<S>))
    .layer(middleware::from_fn_with_state(ledger.clone(), auth::identify::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(ledger)
}
