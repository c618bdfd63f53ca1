//! Core types and the ledger engine for the tontine manager.
//!
//! No HTTP or database dependencies live here. Storage backends implement
//! [`store::BlobStore`]; the [`ledger::Ledger`] engine is generic over that
//! trait.

pub mod account;
pub mod activity;
pub mod credential;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod report;
pub mod schedule;
pub mod store;
pub mod tontine;

mod lenient;

pub use error::{Error, Result};
pub use ledger::{BootstrapAdmin, Ledger, LedgerConfig};
